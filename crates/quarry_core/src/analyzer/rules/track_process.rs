use quarry_error::Result;

use crate::analyzer::scope::Scope;
use crate::analyzer::{Analyzer, AnalyzerRule};
use crate::context::ExecutionContext;
use crate::logical::builder::query_process;
use crate::logical::operator::LogicalOperator;
use crate::tree::Transformed;

/// Wraps the root of the plan in a `QueryProcess` carrying the query id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackProcess;

impl AnalyzerRule for TrackProcess {
    fn name(&self) -> &'static str {
        "track_process"
    }

    fn apply(
        &self,
        ctx: &ExecutionContext,
        _analyzer: &Analyzer,
        _scope: &Scope,
        plan: LogicalOperator,
    ) -> Result<Transformed<LogicalOperator>> {
        match plan {
            plan @ LogicalOperator::QueryProcess(_) => Ok(Transformed::no(plan)),
            plan => Ok(Transformed::yes(query_process(ctx.query_id(), plan))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::rules::testutil::{test_analyzer, test_context};
    use crate::logical::builder::unresolved_table;

    #[test]
    fn wraps_once() {
        let analyzer = test_analyzer();
        let ctx = test_context();

        let wrapped = TrackProcess
            .apply(&ctx, &analyzer, &Scope::empty(), unresolved_table("t"))
            .unwrap();
        assert!(wrapped.changed);
        let LogicalOperator::QueryProcess(process) = &wrapped.node else {
            panic!("expected query process");
        };
        assert_eq!(ctx.query_id(), process.node.query_id);

        let again = TrackProcess
            .apply(&ctx, &analyzer, &Scope::empty(), wrapped.node.clone())
            .unwrap();
        assert!(!again.changed);
        assert_eq!(wrapped.node, again.node);
    }
}
