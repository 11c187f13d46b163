pub mod memory;
pub mod view;

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::RwLock;
use quarry_error::{DbError, Result};

use crate::types::scalar::ScalarValue;
use crate::types::schema::Schema;
use crate::types::Row;

/// What to do when creating an entry that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnConflict {
    Ignore,
    Error,
}

/// A table holding rows.
pub trait Table: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Schema of the table. Every column's source is the table name.
    fn schema(&self) -> &Schema;

    /// Snapshot of all rows in the table.
    fn scan(&self) -> Result<Vec<Row>>;

    /// Append rows. Rows must match the table schema.
    fn insert(&self, rows: Vec<Row>) -> Result<u64>;
}

pub trait Database: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Get the current version of a table.
    fn table(&self, name: &str) -> Option<Arc<dyn Table>>;

    /// Get the version of a table as of some point.
    ///
    /// Databases without versioning return `None`.
    fn table_as_of(&self, name: &str, as_of: &ScalarValue) -> Option<Arc<dyn Table>>;

    fn create_table(
        &self,
        name: &str,
        schema: Schema,
        on_conflict: OnConflict,
    ) -> Result<Option<Arc<dyn Table>>>;
}

/// Registry of databases.
///
/// Lookups are case-insensitive.
#[derive(Debug, Default)]
pub struct Catalog {
    databases: RwLock<HashMap<String, Arc<dyn Database>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a database, replacing any existing database with the same
    /// name.
    pub fn add_database(&self, database: Arc<dyn Database>) {
        let key = database.name().to_lowercase();
        self.databases.write().insert(key, database);
    }

    pub fn database(&self, name: &str) -> Result<Arc<dyn Database>> {
        self.databases
            .read()
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| DbError::DatabaseNotFound(name.to_string()))
    }

    pub fn has_database(&self, name: &str) -> bool {
        self.databases.read().contains_key(&name.to_lowercase())
    }

    /// Names of all registered databases, sorted.
    pub fn database_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .databases
            .read()
            .values()
            .map(|db| db.name().to_string())
            .collect();
        names.sort();
        names
    }
}
