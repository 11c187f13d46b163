use std::fmt;
use std::sync::Arc;

use quarry_error::{internal, Result};

use super::operator::{LogicalNode, Node};
use crate::catalog::Table;
use crate::expr::Expression;
use crate::tree::Transformed;
use crate::types::scalar::ScalarValue;
use crate::types::schema::Schema;

/// Placeholder for a table or view reference produced by the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedTable {
    /// Database the table lives in. Falls back to the context's current
    /// database when not provided.
    pub database: Option<String>,
    pub name: String,
    /// Temporal qualifier selecting a historical version.
    pub as_of: Option<Expression>,
}

impl UnresolvedTable {
    pub fn qualified_name(&self) -> String {
        match &self.database {
            Some(db) => format!("{db}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for UnresolvedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnresolvedTable({}", self.qualified_name())?;
        if let Some(as_of) = &self.as_of {
            write!(f, " AS OF {as_of}")?;
        }
        write!(f, ")")
    }
}

impl LogicalNode for Node<UnresolvedTable> {
    fn name(&self) -> &'static str {
        "UnresolvedTable"
    }

    fn schema(&self) -> Result<Schema> {
        Err(internal!(
            "cannot get schema of unresolved table '{}'",
            self.node.qualified_name()
        ))
    }

    fn for_each_expr<'a, F>(&'a self, mut func: F)
    where
        F: FnMut(&'a Expression),
    {
        if let Some(as_of) = &self.node.as_of {
            func(as_of);
        }
    }

    fn map_exprs<F>(mut self, mut func: F) -> Result<Transformed<Self>>
    where
        F: FnMut(Expression) -> Result<Transformed<Expression>>,
    {
        let Some(as_of) = self.node.as_of.take() else {
            return Ok(Transformed::no(self));
        };
        let transformed = func(as_of)?;
        self.node.as_of = Some(transformed.node);
        Ok(Transformed::new(self, transformed.changed))
    }
}

/// A table bound to a catalog entry.
#[derive(Debug, Clone)]
pub struct ResolvedTable {
    pub database: String,
    pub name: String,
    pub as_of: Option<ScalarValue>,
    pub table: Arc<dyn Table>,
}

impl PartialEq for ResolvedTable {
    fn eq(&self, other: &Self) -> bool {
        self.database == other.database
            && self.name == other.name
            && self.as_of == other.as_of
            && self.table.schema() == other.table.schema()
    }
}

impl fmt::Display for ResolvedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResolvedTable({}.{}", self.database, self.name)?;
        if let Some(as_of) = &self.as_of {
            write!(f, " AS OF {as_of}")?;
        }
        write!(f, ")")
    }
}

impl LogicalNode for Node<ResolvedTable> {
    fn name(&self) -> &'static str {
        "ResolvedTable"
    }

    fn schema(&self) -> Result<Schema> {
        Ok(self.node.table.schema().clone())
    }

    fn for_each_expr<'a, F>(&'a self, _func: F)
    where
        F: FnMut(&'a Expression),
    {
    }

    fn map_exprs<F>(self, _func: F) -> Result<Transformed<Self>>
    where
        F: FnMut(Expression) -> Result<Transformed<Expression>>,
    {
        Ok(Transformed::no(self))
    }
}
