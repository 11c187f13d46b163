use quarry_error::{DbError, Result};
use tracing::trace;

use crate::analyzer::scope::Scope;
use crate::analyzer::{Analyzer, AnalyzerRule};
use crate::context::ExecutionContext;
use crate::expr::column_expr::{ColumnExpr, UnresolvedColumn};
use crate::expr::Expression;
use crate::logical::operator::LogicalOperator;
use crate::tree::{Transformed, TreeNode};
use crate::types::schema::Schema;

/// Binds column references to positions in the input row.
///
/// Columns are looked up in the operator's input first, then in each
/// enclosing scope from the innermost out. Columns that can't be found
/// anywhere are left for a later iteration or for validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveColumns;

impl AnalyzerRule for ResolveColumns {
    fn name(&self) -> &'static str {
        "resolve_columns"
    }

    fn apply(
        &self,
        _ctx: &ExecutionContext,
        _analyzer: &Analyzer,
        scope: &Scope,
        plan: LogicalOperator,
    ) -> Result<Transformed<LogicalOperator>> {
        plan.transform_up(&mut |node| {
            let binds_columns = matches!(
                node,
                LogicalOperator::Project(_)
                    | LogicalOperator::Filter(_)
                    | LogicalOperator::InnerJoin(_)
                    | LogicalOperator::GroupBy(_)
            );
            if !binds_columns || node.node_resolved() || !node.children_resolved() {
                return Ok(Transformed::no(node));
            }

            let input = Schema::merge(
                node.children_ref()
                    .iter()
                    .map(|child| child.schema())
                    .collect::<Result<Vec<_>>>()?,
            );

            node.map_expressions(|expr| {
                expr.transform_up(&mut |expr| match expr {
                    Expression::UnresolvedColumn(col) => bind_column(col, &input, scope),
                    other => Ok(Transformed::no(other)),
                })
            })
        })
    }
}

fn bind_column(
    col: UnresolvedColumn,
    input: &Schema,
    scope: &Scope,
) -> Result<Transformed<Expression>> {
    let qualifier = col.qualifier.as_deref();

    let local = input.find_matches(qualifier, &col.name);
    match local.as_slice() {
        [idx] => {
            let bound = ColumnExpr::from_column(scope.width() + idx, &input.columns[*idx]);
            return Ok(Transformed::yes(Expression::Column(bound)));
        }
        [] => (),
        _ => return Err(DbError::AmbiguousColumn(col.to_string())),
    }

    for (offset, frame) in scope.frames_innermost_first() {
        match frame.find_matches(qualifier, &col.name).as_slice() {
            [idx] => {
                trace!(column = %col, offset, "bound column from outer scope");
                let bound = ColumnExpr::from_column(offset + idx, &frame.columns[*idx]);
                return Ok(Transformed::yes(Expression::Column(bound)));
            }
            [] => continue,
            _ => return Err(DbError::AmbiguousColumn(col.to_string())),
        }
    }

    Ok(Transformed::no(Expression::UnresolvedColumn(col)))
}
