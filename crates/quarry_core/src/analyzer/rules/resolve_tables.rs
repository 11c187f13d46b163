use quarry_error::Result;
use tracing::trace;

use crate::analyzer::scope::Scope;
use crate::analyzer::{Analyzer, AnalyzerRule};
use crate::catalog::Catalog;
use crate::context::ExecutionContext;
use crate::logical::logical_table::{ResolvedTable, UnresolvedTable};
use crate::logical::operator::{LogicalOperator, Node};
use crate::tree::{Transformed, TreeNode};

/// Binds table references to catalog entries.
///
/// References to tables that don't exist are left unresolved and reported
/// during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveTables;

impl AnalyzerRule for ResolveTables {
    fn name(&self) -> &'static str {
        "resolve_tables"
    }

    fn apply(
        &self,
        ctx: &ExecutionContext,
        analyzer: &Analyzer,
        _scope: &Scope,
        plan: LogicalOperator,
    ) -> Result<Transformed<LogicalOperator>> {
        plan.transform_up(&mut |node| match node {
            LogicalOperator::UnresolvedTable(table) => {
                resolve_table(ctx, analyzer.catalog(), table)
            }
            other => Ok(Transformed::no(other)),
        })
    }
}

fn resolve_table(
    ctx: &ExecutionContext,
    catalog: &Catalog,
    table: Node<UnresolvedTable>,
) -> Result<Transformed<LogicalOperator>> {
    let database_name = match &table.node.database {
        Some(database) => database.clone(),
        None => ctx.current_database().to_string(),
    };
    let database = catalog.database(&database_name)?;

    let as_of = match &table.node.as_of {
        Some(expr) => Some(expr.eval(ctx, &[])?),
        None => None,
    };

    let found = match &as_of {
        Some(as_of) => database.table_as_of(&table.node.name, as_of),
        None => database.table(&table.node.name),
    };

    let Some(found) = found else {
        trace!(database = %database_name, table = %table.node.name, "table not found");
        return Ok(Transformed::no(LogicalOperator::UnresolvedTable(table)));
    };

    trace!(database = %database_name, table = %table.node.name, ?as_of, "resolved table");

    Ok(Transformed::yes(LogicalOperator::ResolvedTable(Node::new(
        ResolvedTable {
            database: database_name,
            name: found.name().to_string(),
            as_of,
            table: found,
        },
        Vec::new(),
    ))))
}
