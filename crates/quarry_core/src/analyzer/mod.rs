//! Rule based analysis turning an unresolved plan into a resolved one.

pub mod rules;
pub mod scope;

use std::fmt::{self, Debug};
use std::sync::Arc;

use quarry_error::{internal, DbError, Result};
use scope::Scope;
use tracing::{debug, trace, warn};

use crate::catalog::view::ViewRegistry;
use crate::catalog::Catalog;
use crate::context::ExecutionContext;
use crate::logical::operator::LogicalOperator;
use crate::tree::{Transformed, TreeNode};

pub trait AnalyzerRule: Debug + Send + Sync {
    /// Name of the rule, used for logging and for removing rules.
    fn name(&self) -> &'static str;

    /// Apply the rule to a plan.
    ///
    /// If the rule doesn't apply, the plan should be returned unmodified and
    /// marked as unchanged.
    fn apply(
        &self,
        ctx: &ExecutionContext,
        analyzer: &Analyzer,
        scope: &Scope,
        plan: LogicalOperator,
    ) -> Result<Transformed<LogicalOperator>>;
}

/// Rule backed by a function or closure.
pub struct FnRule<F> {
    name: &'static str,
    func: F,
}

impl<F> FnRule<F>
where
    F: Fn(&ExecutionContext, &Analyzer, &Scope, LogicalOperator) -> Result<Transformed<LogicalOperator>>
        + Send
        + Sync,
{
    pub fn new(name: &'static str, func: F) -> Self {
        FnRule { name, func }
    }
}

impl<F> Debug for FnRule<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRule").field("name", &self.name).finish()
    }
}

impl<F> AnalyzerRule for FnRule<F>
where
    F: Fn(&ExecutionContext, &Analyzer, &Scope, LogicalOperator) -> Result<Transformed<LogicalOperator>>
        + Send
        + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn apply(
        &self,
        ctx: &ExecutionContext,
        analyzer: &Analyzer,
        scope: &Scope,
        plan: LogicalOperator,
    ) -> Result<Transformed<LogicalOperator>> {
        (self.func)(ctx, analyzer, scope, plan)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iterations {
    /// Run every rule exactly once.
    Once,
    /// Repeat until a full pass makes no change, up to the session's
    /// `analyzer_max_iterations`.
    Fixpoint,
}

/// Named, ordered group of rules.
#[derive(Debug)]
pub struct Batch {
    pub name: &'static str,
    pub iterations: Iterations,
    pub rules: Vec<Box<dyn AnalyzerRule>>,
}

impl Batch {
    fn run(
        &self,
        ctx: &ExecutionContext,
        analyzer: &Analyzer,
        scope: &Scope,
        mut plan: LogicalOperator,
    ) -> Result<LogicalOperator> {
        let max_iterations = match self.iterations {
            Iterations::Once => 1,
            Iterations::Fixpoint => ctx.config().analyzer_max_iterations.max(1),
        };

        for iteration in 1..=max_iterations {
            let mut changed = false;
            for rule in &self.rules {
                let transformed = rule.apply(ctx, analyzer, scope, plan)?;
                if transformed.changed {
                    trace!(batch = self.name, rule = rule.name(), iteration, "rule changed plan");
                }
                changed |= transformed.changed;
                plan = transformed.node;
            }

            if !changed {
                trace!(batch = self.name, iteration, "batch reached fixpoint");
                return Ok(plan);
            }
        }

        if self.iterations == Iterations::Fixpoint {
            if let Some((kind, name)) = plan.first_unresolved() {
                debug!(batch = self.name, max_iterations, %kind, %name, "batch exhausted iterations");
                return Err(DbError::unresolved(kind, name));
            }
            warn!(batch = self.name, max_iterations, "batch exhausted iterations without reaching fixpoint");
        }

        Ok(plan)
    }
}

/// Runs ordered batches of rules over a plan.
///
/// Holds no per-query state and may be shared between concurrent analyses.
#[derive(Debug)]
pub struct Analyzer {
    catalog: Arc<Catalog>,
    views: Arc<ViewRegistry>,
    batches: Vec<Batch>,
}

impl Analyzer {
    /// Analyzer with the default rule batches.
    pub fn new(catalog: Arc<Catalog>, views: Arc<ViewRegistry>) -> Self {
        AnalyzerBuilder::new(catalog, views).build()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn views(&self) -> &ViewRegistry {
        &self.views
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn analyze(&self, ctx: &ExecutionContext, plan: LogicalOperator) -> Result<LogicalOperator> {
        self.analyze_with_scope(ctx, plan, &Scope::empty())
    }

    /// Analyze a plan nested inside some outer query.
    pub fn analyze_with_scope(
        &self,
        ctx: &ExecutionContext,
        mut plan: LogicalOperator,
        scope: &Scope,
    ) -> Result<LogicalOperator> {
        debug!(query_id = %ctx.query_id(), scope_width = scope.width(), "analyzing plan");

        for batch in &self.batches {
            ctx.check_cancelled()?;
            trace!(batch = batch.name, "running batch");
            plan = batch.run(ctx, self, scope, plan)?;
        }

        if !plan.resolved() {
            return Err(internal!("analysis finished with an unresolved plan"));
        }

        Ok(plan)
    }
}

/// Builds an analyzer, allowing rules to be added or removed.
#[derive(Debug)]
pub struct AnalyzerBuilder {
    catalog: Arc<Catalog>,
    views: Arc<ViewRegistry>,
    pre_analyze: Vec<Box<dyn AnalyzerRule>>,
    once_before: Vec<Box<dyn AnalyzerRule>>,
    default_rules: Vec<Box<dyn AnalyzerRule>>,
    once_after: Vec<Box<dyn AnalyzerRule>>,
    post_analyze: Vec<Box<dyn AnalyzerRule>>,
    validation: Vec<Box<dyn AnalyzerRule>>,
}

impl AnalyzerBuilder {
    pub fn new(catalog: Arc<Catalog>, views: Arc<ViewRegistry>) -> Self {
        AnalyzerBuilder {
            catalog,
            views,
            pre_analyze: Vec::new(),
            once_before: rules::once_before(),
            default_rules: rules::default_rules(),
            once_after: rules::once_after(),
            post_analyze: Vec::new(),
            validation: rules::validation(),
        }
    }

    /// Add a rule that runs before all default rules.
    pub fn add_pre_analyze_rule(mut self, rule: impl AnalyzerRule + 'static) -> Self {
        self.pre_analyze.push(Box::new(rule));
        self
    }

    /// Add a rule that runs after the default rules, before validation.
    pub fn add_post_analyze_rule(mut self, rule: impl AnalyzerRule + 'static) -> Self {
        self.post_analyze.push(Box::new(rule));
        self
    }

    pub fn add_validation_rule(mut self, rule: impl AnalyzerRule + 'static) -> Self {
        self.validation.push(Box::new(rule));
        self
    }

    /// Remove every rule with the given name from all batches.
    pub fn remove_rule(mut self, name: &str) -> Self {
        for rules in [
            &mut self.pre_analyze,
            &mut self.once_before,
            &mut self.default_rules,
            &mut self.once_after,
            &mut self.post_analyze,
            &mut self.validation,
        ] {
            rules.retain(|rule| rule.name() != name);
        }
        self
    }

    pub fn build(self) -> Analyzer {
        let batches = [
            ("pre_analyze", Iterations::Fixpoint, self.pre_analyze),
            ("once_before", Iterations::Once, self.once_before),
            ("default_rules", Iterations::Fixpoint, self.default_rules),
            ("once_after", Iterations::Once, self.once_after),
            ("post_analyze", Iterations::Fixpoint, self.post_analyze),
            ("validation", Iterations::Once, self.validation),
        ]
        .into_iter()
        .filter(|(_, _, rules)| !rules.is_empty())
        .map(|(name, iterations, rules)| Batch {
            name,
            iterations,
            rules,
        })
        .collect();

        Analyzer {
            catalog: self.catalog,
            views: self.views,
            batches,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use quarry_error::EntityKind;

    use super::*;
    use crate::analyzer::rules::testutil::{test_analyzer, test_catalog, test_context};
    use crate::catalog::view::View;
    use crate::config::session::SessionConfig;
    use crate::context::CancellationToken;
    use crate::expr::{eq, lit, star, unresolved_col};
    use crate::logical::builder::{filter, project, subquery_alias, unresolved_table};

    fn context_with_iterations(n: u64) -> ExecutionContext {
        let config = SessionConfig {
            analyzer_max_iterations: n,
            ..Default::default()
        };
        ExecutionContext::new("mydb", Arc::new(config))
    }

    #[test]
    fn analyze_simple_query() {
        let analyzer = test_analyzer();
        let ctx = test_context();

        let plan = project(
            vec![star()],
            filter(
                eq(unresolved_col("i"), lit(2_i64)),
                unresolved_table("mytable"),
            ),
        );
        let analyzed = analyzer.analyze(&ctx, plan).unwrap();

        assert!(analyzed.resolved());
        let LogicalOperator::QueryProcess(process) = &analyzed else {
            panic!("expected query process at root");
        };
        assert_eq!(ctx.query_id(), process.node.query_id);

        let names: Vec<_> = analyzed
            .schema()
            .unwrap()
            .iter()
            .map(|c| c.name.clone())
            .collect();
        assert_eq!(vec!["i", "s"], names);
    }

    #[test]
    fn analyze_through_view() {
        let views = Arc::new(ViewRegistry::new());
        views
            .register(
                "mydb",
                View::new(
                    "myview",
                    subquery_alias(
                        "myview",
                        project(vec![unresolved_col("i")], unresolved_table("mytable")),
                    ),
                ),
            )
            .unwrap();
        let analyzer = Analyzer::new(test_catalog(), views);

        let analyzed = analyzer
            .analyze(
                &test_context(),
                project(vec![unresolved_col("i")], unresolved_table("myview")),
            )
            .unwrap();
        let schema = analyzed.schema().unwrap();
        assert_eq!(1, schema.len());
        assert_eq!("myview", schema.columns[0].source);
    }

    #[test]
    fn unknown_table_fails_validation() {
        let err = test_analyzer()
            .analyze(&test_context(), unresolved_table("nope"))
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::UnresolvedEntity { kind: EntityKind::Table, name } if name == "nope"
        ));
    }

    #[test]
    fn missing_table_reported_before_its_columns() {
        let err = test_analyzer()
            .analyze(
                &test_context(),
                project(vec![unresolved_col("i")], unresolved_table("nope")),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::UnresolvedEntity { kind: EntityKind::Table, name } if name == "nope"
        ));
    }

    #[test]
    fn fixpoint_cap_with_unresolved_plan() {
        let applied = Arc::new(AtomicUsize::new(0));
        let counter = applied.clone();
        let analyzer = AnalyzerBuilder::new(test_catalog(), Arc::new(ViewRegistry::new()))
            .add_pre_analyze_rule(FnRule::new("always_changes", move |_, _, _, plan| {
                counter.fetch_add(1, Ordering::Relaxed);
                Ok(Transformed::yes(plan))
            }))
            .build();

        let err = analyzer
            .analyze(&context_with_iterations(3), unresolved_table("nope"))
            .unwrap_err();
        assert_eq!(3, applied.load(Ordering::Relaxed));
        assert!(matches!(
            err,
            DbError::UnresolvedEntity { kind: EntityKind::Table, name } if name == "nope"
        ));
    }

    #[test]
    fn fixpoint_cap_with_resolved_plan() {
        let analyzer = AnalyzerBuilder::new(test_catalog(), Arc::new(ViewRegistry::new()))
            .add_post_analyze_rule(FnRule::new("always_changes", |_, _, _, plan| {
                Ok(Transformed::yes(plan))
            }))
            .build();

        let analyzed = analyzer
            .analyze(&context_with_iterations(2), unresolved_table("mytable"))
            .unwrap();
        assert!(analyzed.resolved());
    }

    #[test]
    fn cancelled_before_analysis() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = test_context().with_cancellation(token);

        let err = test_analyzer()
            .analyze(&ctx, unresolved_table("mytable"))
            .unwrap_err();
        assert!(err.is_cancellation());
    }

    #[test]
    fn cancelled_between_batches() {
        let ctx = test_context();
        let token = ctx.cancellation_token().clone();
        let analyzer = AnalyzerBuilder::new(test_catalog(), Arc::new(ViewRegistry::new()))
            .add_pre_analyze_rule(FnRule::new("cancel", move |_, _, _, plan| {
                token.cancel();
                Ok(Transformed::no(plan))
            }))
            .build();

        let err = analyzer
            .analyze(&ctx, unresolved_table("mytable"))
            .unwrap_err();
        assert!(matches!(err, DbError::Cancelled));
    }

    #[test]
    fn remove_default_rule() {
        let analyzer = AnalyzerBuilder::new(test_catalog(), Arc::new(ViewRegistry::new()))
            .remove_rule("track_process")
            .build();
        assert!(analyzer.batches().iter().all(|b| b.name != "once_after"));

        let analyzed = analyzer
            .analyze(&test_context(), unresolved_table("mytable"))
            .unwrap();
        assert!(matches!(analyzed, LogicalOperator::ResolvedTable(_)));
    }

    #[test]
    fn batch_order() {
        let analyzer = AnalyzerBuilder::new(test_catalog(), Arc::new(ViewRegistry::new()))
            .add_pre_analyze_rule(FnRule::new("noop", |_, _, _, plan| Ok(Transformed::no(plan))))
            .add_post_analyze_rule(FnRule::new("noop", |_, _, _, plan| Ok(Transformed::no(plan))))
            .build();

        let names: Vec<_> = analyzer.batches().iter().map(|b| b.name).collect();
        assert_eq!(
            vec![
                "pre_analyze",
                "once_before",
                "default_rules",
                "once_after",
                "post_analyze",
                "validation"
            ],
            names
        );
    }
}
