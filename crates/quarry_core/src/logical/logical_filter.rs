use std::fmt;

use quarry_error::Result;

use super::operator::{LogicalNode, Node};
use crate::expr::Expression;
use crate::tree::Transformed;
use crate::types::schema::Schema;

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalFilter {
    pub filter: Expression,
}

impl fmt::Display for LogicalFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Filter({})", self.filter)
    }
}

impl LogicalNode for Node<LogicalFilter> {
    fn name(&self) -> &'static str {
        "Filter"
    }

    fn schema(&self) -> Result<Schema> {
        self.get_one_child_exact()?.schema()
    }

    fn for_each_expr<'a, F>(&'a self, mut func: F)
    where
        F: FnMut(&'a Expression),
    {
        func(&self.node.filter)
    }

    fn map_exprs<F>(self, mut func: F) -> Result<Transformed<Self>>
    where
        F: FnMut(Expression) -> Result<Transformed<Expression>>,
    {
        let filter = func(self.node.filter)?;
        Ok(filter.map(|filter| Node::new(LogicalFilter { filter }, self.children)))
    }
}
