use std::fmt;

use quarry_error::Result;

use super::operator::{fmt_exprs, map_expr_list, LogicalNode, Node};
use crate::expr::Expression;
use crate::tree::Transformed;
use crate::types::schema::{Column, Schema};

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalProject {
    pub projections: Vec<Expression>,
}

impl fmt::Display for LogicalProject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Project({})", fmt_exprs(&self.projections))
    }
}

impl LogicalNode for Node<LogicalProject> {
    fn name(&self) -> &'static str {
        "Project"
    }

    fn schema(&self) -> Result<Schema> {
        exprs_schema(&self.node.projections)
    }

    fn for_each_expr<'a, F>(&'a self, mut func: F)
    where
        F: FnMut(&'a Expression),
    {
        for expr in &self.node.projections {
            func(expr);
        }
    }

    fn map_exprs<F>(self, mut func: F) -> Result<Transformed<Self>>
    where
        F: FnMut(Expression) -> Result<Transformed<Expression>>,
    {
        let projections = map_expr_list(self.node.projections, &mut func)?;
        Ok(projections.map(|projections| {
            Node::new(LogicalProject { projections }, self.children)
        }))
    }
}

/// Schema produced by evaluating a list of expressions.
pub(crate) fn exprs_schema(exprs: &[Expression]) -> Result<Schema> {
    exprs
        .iter()
        .map(|expr| {
            Ok(Column::new(expr.name(), expr.datatype()?, expr.nullable())
                .with_source(expr.source()))
        })
        .collect::<Result<Vec<_>>>()
        .map(Schema::new)
}
