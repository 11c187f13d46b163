use std::fmt;

use quarry_error::Result;

use super::logical_project::exprs_schema;
use super::operator::{fmt_exprs, map_expr_list, LogicalNode, Node};
use crate::expr::Expression;
use crate::tree::Transformed;
use crate::types::schema::Schema;

/// Grouped aggregation.
///
/// Produces one row per distinct grouping key. Selected expressions may mix
/// aggregates and plain expressions; plain expressions take their value from
/// the first row of each group. An empty grouping list with aggregates
/// produces a single row even with no input.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalGroupBy {
    pub selected: Vec<Expression>,
    pub grouping: Vec<Expression>,
}

impl fmt::Display for LogicalGroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GroupBy(selected: [{}], grouping: [{}])",
            fmt_exprs(&self.selected),
            fmt_exprs(&self.grouping)
        )
    }
}

impl LogicalNode for Node<LogicalGroupBy> {
    fn name(&self) -> &'static str {
        "GroupBy"
    }

    fn schema(&self) -> Result<Schema> {
        exprs_schema(&self.node.selected)
    }

    fn for_each_expr<'a, F>(&'a self, mut func: F)
    where
        F: FnMut(&'a Expression),
    {
        for expr in self.node.selected.iter().chain(&self.node.grouping) {
            func(expr);
        }
    }

    fn map_exprs<F>(self, mut func: F) -> Result<Transformed<Self>>
    where
        F: FnMut(Expression) -> Result<Transformed<Expression>>,
    {
        let selected = map_expr_list(self.node.selected, &mut func)?;
        let grouping = map_expr_list(self.node.grouping, &mut func)?;
        let changed = selected.changed || grouping.changed;

        Ok(Transformed::new(
            Node::new(
                LogicalGroupBy {
                    selected: selected.node,
                    grouping: grouping.node,
                },
                self.children,
            ),
            changed,
        ))
    }
}
