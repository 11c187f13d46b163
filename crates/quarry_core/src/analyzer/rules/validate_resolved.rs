use quarry_error::{DbError, Result};

use crate::analyzer::scope::Scope;
use crate::analyzer::{Analyzer, AnalyzerRule};
use crate::context::ExecutionContext;
use crate::logical::operator::LogicalOperator;
use crate::tree::Transformed;

/// Fails analysis if anything in the plan is still unresolved, and checks
/// that every operator produces a valid schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidateResolved;

impl AnalyzerRule for ValidateResolved {
    fn name(&self) -> &'static str {
        "validate_resolved"
    }

    fn apply(
        &self,
        _ctx: &ExecutionContext,
        _analyzer: &Analyzer,
        _scope: &Scope,
        plan: LogicalOperator,
    ) -> Result<Transformed<LogicalOperator>> {
        if let Some((kind, name)) = plan.first_unresolved() {
            return Err(DbError::unresolved(kind, name));
        }
        plan.schema()?;
        Ok(Transformed::no(plan))
    }
}
