use std::fmt;

use quarry_error::Result;
use uuid::Uuid;

use super::operator::{LogicalNode, Node};
use crate::expr::Expression;
use crate::tree::Transformed;
use crate::types::schema::Schema;

/// Top-level wrapper associating a plan with the query that's running it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryProcess {
    pub query_id: Uuid,
}

impl fmt::Display for QueryProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QueryProcess({})", self.query_id)
    }
}

impl LogicalNode for Node<QueryProcess> {
    fn name(&self) -> &'static str {
        "QueryProcess"
    }

    fn schema(&self) -> Result<Schema> {
        self.get_one_child_exact()?.schema()
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
