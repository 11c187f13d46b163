use std::collections::HashMap;

use parking_lot::RwLock;
use quarry_error::{DbError, Result};
use tracing::debug;

use crate::logical::operator::LogicalOperator;
use crate::tree::walk;

/// A named view and its defining plan.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    name: String,
    definition: LogicalOperator,
    has_as_of: bool,
}

impl View {
    pub fn new(name: impl Into<String>, definition: LogicalOperator) -> Self {
        let has_as_of = walk::any(&definition, |node| match node {
            LogicalOperator::UnresolvedTable(table) => table.node.as_of.is_some(),
            LogicalOperator::ResolvedTable(table) => table.node.as_of.is_some(),
            _ => false,
        });

        View {
            name: name.into(),
            definition,
            has_as_of,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definition(&self) -> &LogicalOperator {
        &self.definition
    }

    pub fn into_definition(self) -> LogicalOperator {
        self.definition
    }

    /// If the definition pins any of its tables to a point in time.
    pub fn has_as_of(&self) -> bool {
        self.has_as_of
    }
}

/// Views keyed by (database, name). Keys are case-insensitive.
#[derive(Debug, Default)]
pub struct ViewRegistry {
    views: RwLock<HashMap<(String, String), View>>,
}

fn view_key(database: &str, name: &str) -> (String, String) {
    (database.to_lowercase(), name.to_lowercase())
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a view, failing if one with the same name already exists in
    /// the database.
    pub fn register(&self, database: &str, view: View) -> Result<()> {
        let key = view_key(database, view.name());
        let mut views = self.views.write();
        if views.contains_key(&key) {
            return Err(DbError::ViewAlreadyExists {
                database: database.to_string(),
                view: view.name().to_string(),
            });
        }

        debug!(%database, view = %view.name(), has_as_of = view.has_as_of(), "registering view");
        views.insert(key, view);

        Ok(())
    }

    /// Get a copy of a view.
    ///
    /// The returned definition is independent of the stored one, and of any
    /// other copy.
    pub fn resolve(&self, database: &str, name: &str) -> Option<View> {
        self.views.read().get(&view_key(database, name)).cloned()
    }

    /// Remove a view, returning true if it existed.
    pub fn delete(&self, database: &str, name: &str) -> bool {
        self.views.write().remove(&view_key(database, name)).is_some()
    }

    pub fn exists(&self, database: &str, name: &str) -> bool {
        self.views.read().contains_key(&view_key(database, name))
    }

    /// All views in a database, sorted by name.
    pub fn views_for_database(&self, database: &str) -> Vec<View> {
        let database = database.to_lowercase();
        let mut views: Vec<_> = self
            .views
            .read()
            .iter()
            .filter(|((db, _), _)| *db == database)
            .map(|(_, view)| view.clone())
            .collect();
        views.sort_by(|a, b| a.name.cmp(&b.name));
        views
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::lit;
    use crate::logical::builder::{subquery_alias, unresolved_table, unresolved_table_as_of};

    #[test]
    fn register_twice_fails() {
        let registry = ViewRegistry::new();
        let view = View::new("v", subquery_alias("v", unresolved_table("t")));

        registry.register("db", view.clone()).unwrap();
        let err = registry.register("DB", view).unwrap_err();
        assert!(matches!(err, DbError::ViewAlreadyExists { .. }));
    }

    #[test]
    fn resolve_returns_copy() {
        let registry = ViewRegistry::new();
        let view = View::new("v", subquery_alias("v", unresolved_table("t")));
        registry.register("db", view.clone()).unwrap();

        let resolved = registry.resolve("db", "V").unwrap();
        assert_eq!(view, resolved);
        assert!(!resolved.has_as_of());
        assert!(registry.resolve("other", "v").is_none());
    }

    #[test]
    fn detects_as_of() {
        let view = View::new(
            "v",
            subquery_alias("v", unresolved_table_as_of("t", lit("2019-01-01"))),
        );
        assert!(view.has_as_of());
    }

    #[test]
    fn delete_view() {
        let registry = ViewRegistry::new();
        registry
            .register("db", View::new("v", unresolved_table("t")))
            .unwrap();
        assert!(registry.exists("db", "v"));
        assert!(registry.delete("db", "v"));
        assert!(!registry.exists("db", "v"));
        assert!(!registry.delete("db", "v"));
    }

    #[test]
    fn list_views() {
        let registry = ViewRegistry::new();
        for name in ["b", "a"] {
            registry
                .register("db", View::new(name, unresolved_table("t")))
                .unwrap();
        }
        let names: Vec<_> = registry
            .views_for_database("db")
            .iter()
            .map(|v| v.name().to_string())
            .collect();
        assert_eq!(vec!["a", "b"], names);
    }
}
