use std::fmt;

use quarry_error::Result;

use super::operator::{LogicalNode, Node};
use crate::expr::Expression;
use crate::tree::Transformed;
use crate::types::schema::Schema;

/// Cartesian product of the two children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalCrossJoin;

impl fmt::Display for LogicalCrossJoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CrossJoin")
    }
}

impl LogicalNode for Node<LogicalCrossJoin> {
    fn name(&self) -> &'static str {
        "CrossJoin"
    }

    fn schema(&self) -> Result<Schema> {
        self.children_schema()
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

/// Join keeping pairs of rows for which the condition is true.
///
/// The condition is evaluated against the left row followed by the right row.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalInnerJoin {
    pub condition: Expression,
}

impl fmt::Display for LogicalInnerJoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InnerJoin({})", self.condition)
    }
}

impl LogicalNode for Node<LogicalInnerJoin> {
    fn name(&self) -> &'static str {
        "InnerJoin"
    }

    fn schema(&self) -> Result<Schema> {
        self.children_schema()
    }

    fn for_each_expr<'a, F>(&'a self, mut func: F)
    where
        F: FnMut(&'a Expression),
    {
        func(&self.node.condition)
    }

    fn map_exprs<F>(self, mut func: F) -> Result<Transformed<Self>>
    where
        F: FnMut(Expression) -> Result<Transformed<Expression>>,
    {
        let condition = func(self.node.condition)?;
        Ok(condition.map(|condition| Node::new(LogicalInnerJoin { condition }, self.children)))
    }
}
