use std::fmt;

use quarry_error::Result;

use super::operator::{LogicalNode, Node};
use crate::catalog::OnConflict;
use crate::expr::Expression;
use crate::tree::Transformed;
use crate::types::datatype::DataType;
use crate::types::schema::{Column, Schema};

/// CREATE TABLE, optionally with a SELECT providing the initial rows as its
/// only child.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalCreateTable {
    pub database: Option<String>,
    pub name: String,
    /// Columns of the new table.
    ///
    /// Starts as the explicit DDL column list. For CREATE TABLE AS SELECT,
    /// analysis replaces this with the DDL columns merged with the SELECT
    /// output.
    pub columns: Schema,
    pub on_conflict: OnConflict,
}

impl fmt::Display for LogicalCreateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns: Vec<_> = self
            .columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.datatype))
            .collect();
        write!(f, "CreateTable({} [{}])", self.name, columns.join(", "))
    }
}

impl LogicalNode for Node<LogicalCreateTable> {
    fn name(&self) -> &'static str {
        "CreateTable"
    }

    /// Number of rows inserted into the new table.
    fn schema(&self) -> Result<Schema> {
        Ok(Schema::new([Column::new(
            "rows_affected",
            DataType::UInt64,
            false,
        )]))
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
