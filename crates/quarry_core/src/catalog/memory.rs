use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use quarry_error::{eval_error, DbError, Result};
use tracing::debug;

use super::{Database, OnConflict, Table};
use crate::types::scalar::ScalarValue;
use crate::types::schema::Schema;
use crate::types::Row;

/// Table with all rows held in memory.
#[derive(Debug)]
pub struct MemoryTable {
    name: String,
    schema: Schema,
    rows: RwLock<Vec<Row>>,
}

impl MemoryTable {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        let name = name.into();
        let schema = schema.with_source(&name);
        MemoryTable {
            name,
            schema,
            rows: RwLock::new(Vec::new()),
        }
    }

    pub fn with_rows(name: impl Into<String>, schema: Schema, rows: Vec<Row>) -> Result<Self> {
        let table = Self::new(name, schema);
        table.insert(rows)?;
        Ok(table)
    }
}

impl Table for MemoryTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn scan(&self) -> Result<Vec<Row>> {
        Ok(self.rows.read().clone())
    }

    fn insert(&self, rows: Vec<Row>) -> Result<u64> {
        if let Some(row) = rows.iter().find(|row| row.len() != self.schema.len()) {
            return Err(eval_error!(
                "row of width {} does not match table '{}' with {} columns",
                row.len(),
                self.name,
                self.schema.len()
            ));
        }

        let count = rows.len() as u64;
        self.rows.write().extend(rows);
        Ok(count)
    }
}

#[derive(Debug, Default)]
struct MemoryTables {
    current: HashMap<String, Arc<MemoryTable>>,
    /// Historical versions keyed by their AS OF value, kept in insertion
    /// order.
    versions: HashMap<String, Vec<(ScalarValue, Arc<MemoryTable>)>>,
}

/// Versioned in-memory database.
#[derive(Debug)]
pub struct MemoryDatabase {
    name: String,
    tables: RwLock<MemoryTables>,
}

impl MemoryDatabase {
    pub fn new(name: impl Into<String>) -> Self {
        MemoryDatabase {
            name: name.into(),
            tables: RwLock::new(MemoryTables::default()),
        }
    }

    /// Add an existing table as the current version.
    pub fn add_table(&self, table: MemoryTable) -> Arc<MemoryTable> {
        let table = Arc::new(table);
        self.tables
            .write()
            .current
            .insert(table.name().to_lowercase(), table.clone());
        table
    }

    /// Add a historical version of a table, visible through `table_as_of`.
    pub fn add_table_version(&self, as_of: ScalarValue, table: MemoryTable) {
        let key = table.name().to_lowercase();
        self.tables
            .write()
            .versions
            .entry(key)
            .or_default()
            .push((as_of, Arc::new(table)));
    }
}

impl Database for MemoryDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    fn table(&self, name: &str) -> Option<Arc<dyn Table>> {
        let tables = self.tables.read();
        tables
            .current
            .get(&name.to_lowercase())
            .map(|table| table.clone() as Arc<dyn Table>)
    }

    /// Returns the newest version at or before `as_of`.
    fn table_as_of(&self, name: &str, as_of: &ScalarValue) -> Option<Arc<dyn Table>> {
        let tables = self.tables.read();
        let versions = tables.versions.get(&name.to_lowercase())?;

        let mut best: Option<&(ScalarValue, Arc<MemoryTable>)> = None;
        for version in versions {
            let at_or_before = matches!(
                version.0.try_cmp(as_of),
                Ok(Some(Ordering::Less | Ordering::Equal))
            );
            if !at_or_before {
                continue;
            }
            let newer = match best {
                Some(best) => matches!(version.0.try_cmp(&best.0), Ok(Some(Ordering::Greater))),
                None => true,
            };
            if newer {
                best = Some(version);
            }
        }

        best.map(|(_, table)| table.clone() as Arc<dyn Table>)
    }

    fn create_table(
        &self,
        name: &str,
        schema: Schema,
        on_conflict: OnConflict,
    ) -> Result<Option<Arc<dyn Table>>> {
        let mut tables = self.tables.write();
        let key = name.to_lowercase();

        if tables.current.contains_key(&key) {
            return match on_conflict {
                OnConflict::Ignore => Ok(None),
                OnConflict::Error => Err(DbError::TableAlreadyExists {
                    database: self.name.clone(),
                    table: name.to_string(),
                }),
            };
        }

        debug!(database = %self.name, table = %name, columns = schema.len(), "creating table");

        let table = Arc::new(MemoryTable::new(name, schema));
        tables.current.insert(key, table.clone());

        Ok(Some(table as Arc<dyn Table>))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::datatype::DataType;
    use crate::types::schema::Column;

    fn schema() -> Schema {
        Schema::new([Column::new("a", DataType::Int64, false)])
    }

    #[test]
    fn table_source_is_table_name() {
        let table = MemoryTable::new("t1", schema());
        assert_eq!("t1", table.schema().columns[0].source);
    }

    #[test]
    fn create_conflict() {
        let db = MemoryDatabase::new("db");
        db.create_table("t1", schema(), OnConflict::Error).unwrap();

        let err = db.create_table("T1", schema(), OnConflict::Error).unwrap_err();
        assert!(matches!(err, DbError::TableAlreadyExists { .. }));

        let out = db.create_table("t1", schema(), OnConflict::Ignore).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn insert_checks_width() {
        let table = MemoryTable::new("t1", schema());
        table.insert(vec![vec![ScalarValue::Int64(1)]]).unwrap();
        table
            .insert(vec![vec![ScalarValue::Int64(1), ScalarValue::Int64(2)]])
            .unwrap_err();
        assert_eq!(1, table.scan().unwrap().len());
    }

    #[test]
    fn as_of_picks_newest_at_or_before() {
        let db = MemoryDatabase::new("db");
        for (version, value) in [(1, 10), (3, 30), (2, 20)] {
            let table =
                MemoryTable::with_rows("t1", schema(), vec![vec![ScalarValue::Int64(value)]])
                    .unwrap();
            db.add_table_version(ScalarValue::Int64(version), table);
        }

        let rows = db
            .table_as_of("t1", &ScalarValue::Int64(2))
            .unwrap()
            .scan()
            .unwrap();
        assert_eq!(vec![vec![ScalarValue::Int64(20)]], rows);

        let rows = db
            .table_as_of("t1", &ScalarValue::Int64(100))
            .unwrap()
            .scan()
            .unwrap();
        assert_eq!(vec![vec![ScalarValue::Int64(30)]], rows);

        assert!(db.table_as_of("t1", &ScalarValue::Int64(0)).is_none());
        assert!(db.table("t1").is_none());
    }
}
