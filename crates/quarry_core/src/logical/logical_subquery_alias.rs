use std::fmt;

use quarry_error::Result;

use super::operator::{LogicalNode, Node};
use crate::expr::Expression;
use crate::tree::Transformed;
use crate::types::schema::Schema;

/// Names the output of a subquery, e.g. `(SELECT ...) AS sq`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubqueryAlias {
    pub alias: String,
}

impl fmt::Display for SubqueryAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubqueryAlias({})", self.alias)
    }
}

impl LogicalNode for Node<SubqueryAlias> {
    fn name(&self) -> &'static str {
        "SubqueryAlias"
    }

    /// Child schema with every column's source replaced by the alias.
    fn schema(&self) -> Result<Schema> {
        Ok(self
            .get_one_child_exact()?
            .schema()?
            .with_source(&self.node.alias))
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
