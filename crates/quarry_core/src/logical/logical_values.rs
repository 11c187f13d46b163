use std::fmt;

use quarry_error::Result;

use super::operator::{fmt_exprs, map_expr_list, LogicalNode, Node};
use crate::expr::Expression;
use crate::tree::Transformed;
use crate::types::datatype::DataType;
use crate::types::schema::{Column, Schema};

/// Literal rows, e.g. `VALUES (1, 'a'), (2, 'b')`.
///
/// Output columns are named `column1`, `column2`, ...
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalValues {
    pub rows: Vec<Vec<Expression>>,
}

impl fmt::Display for LogicalValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<_> = self
            .rows
            .iter()
            .map(|row| format!("({})", fmt_exprs(row)))
            .collect();
        write!(f, "Values({})", rows.join(", "))
    }
}

impl LogicalNode for Node<LogicalValues> {
    fn name(&self) -> &'static str {
        "Values"
    }

    /// Types come from the first row with a non-NULL value in each column.
    fn schema(&self) -> Result<Schema> {
        let width = self.node.rows.first().map(|row| row.len()).unwrap_or(0);
        let mut columns = Vec::with_capacity(width);

        for idx in 0..width {
            let mut datatype = DataType::Null;
            let mut nullable = false;
            for row in &self.node.rows {
                let Some(expr) = row.get(idx) else {
                    continue;
                };
                nullable |= expr.nullable();
                let expr_type = expr.datatype()?;
                if datatype == DataType::Null {
                    datatype = expr_type;
                }
            }
            columns.push(Column::new(format!("column{}", idx + 1), datatype, nullable));
        }

        Ok(Schema::new(columns))
    }

    fn for_each_expr<'a, F>(&'a self, mut func: F)
    where
        F: FnMut(&'a Expression),
    {
        for expr in self.node.rows.iter().flatten() {
            func(expr);
        }
    }

    fn map_exprs<F>(self, mut func: F) -> Result<Transformed<Self>>
    where
        F: FnMut(Expression) -> Result<Transformed<Expression>>,
    {
        let mut changed = false;
        let mut rows = Vec::with_capacity(self.node.rows.len());
        for row in self.node.rows {
            let transformed = map_expr_list(row, &mut func)?;
            changed |= transformed.changed;
            rows.push(transformed.node);
        }

        Ok(Transformed::new(
            Node::new(LogicalValues { rows }, self.children),
            changed,
        ))
    }
}
