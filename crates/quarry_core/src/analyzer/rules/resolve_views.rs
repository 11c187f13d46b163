use quarry_error::{internal, DbError, Result};
use tracing::debug;

use crate::analyzer::scope::Scope;
use crate::analyzer::{Analyzer, AnalyzerRule};
use crate::catalog::view::ViewRegistry;
use crate::context::ExecutionContext;
use crate::expr::Expression;
use crate::logical::operator::LogicalOperator;
use crate::tree::{Transformed, TreeNode};

/// Views referencing views nest no deeper than this.
const MAX_VIEW_DEPTH: usize = 32;

/// Replaces references to registered views with a copy of the view's
/// definition.
///
/// An AS OF on the reference is pushed down to every table in the
/// definition. Definitions that carry their own AS OF can't be queried with
/// another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveViews;

impl AnalyzerRule for ResolveViews {
    fn name(&self) -> &'static str {
        "resolve_views"
    }

    fn apply(
        &self,
        ctx: &ExecutionContext,
        analyzer: &Analyzer,
        _scope: &Scope,
        plan: LogicalOperator,
    ) -> Result<Transformed<LogicalOperator>> {
        resolve_views(ctx, analyzer.views(), plan, 0)
    }
}

fn resolve_views(
    ctx: &ExecutionContext,
    views: &ViewRegistry,
    plan: LogicalOperator,
    depth: usize,
) -> Result<Transformed<LogicalOperator>> {
    plan.transform_up(&mut |node| {
        let (database, name, as_of) = match &node {
            LogicalOperator::UnresolvedTable(table) => (
                table
                    .node
                    .database
                    .clone()
                    .unwrap_or_else(|| ctx.current_database().to_string()),
                table.node.name.clone(),
                table.node.as_of.clone(),
            ),
            _ => return Ok(Transformed::no(node)),
        };

        let Some(view) = views.resolve(&database, &name) else {
            return Ok(Transformed::no(node));
        };

        if depth >= MAX_VIEW_DEPTH {
            return Err(internal!(
                "view '{name}' exceeds maximum nesting depth of {MAX_VIEW_DEPTH}"
            ));
        }

        let definition = match as_of {
            None => view.into_definition(),
            Some(_) if view.has_as_of() => {
                return Err(DbError::IncompatibleAsOf {
                    view: view.name().to_string(),
                });
            }
            Some(as_of) => push_down_as_of(view.into_definition(), &as_of)?,
        };

        debug!(%database, view = %name, depth, "substituting view definition");

        // Definitions may themselves reference views.
        let definition = resolve_views(ctx, views, definition, depth + 1)?.into_inner();

        Ok(Transformed::yes(definition))
    })
}

/// Set `as_of` on every table reference in the plan.
fn push_down_as_of(plan: LogicalOperator, as_of: &Expression) -> Result<LogicalOperator> {
    let transformed = plan.transform_up(&mut |node| match node {
        LogicalOperator::UnresolvedTable(mut table) => {
            table.node.as_of = Some(as_of.clone());
            Ok(Transformed::yes(LogicalOperator::UnresolvedTable(table)))
        }
        other => Ok(Transformed::no(other)),
    })?;
    Ok(transformed.into_inner())
}
