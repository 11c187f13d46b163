use quarry_error::{DbError, EntityKind, Result};

use crate::analyzer::scope::Scope;
use crate::analyzer::{Analyzer, AnalyzerRule};
use crate::context::ExecutionContext;
use crate::expr::column_expr::ColumnExpr;
use crate::expr::Expression;
use crate::logical::logical_project::LogicalProject;
use crate::logical::operator::{LogicalOperator, Node};
use crate::tree::{Transformed, TreeNode};

/// Expands `*` and `table.*` in projections once the input is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveStar;

impl AnalyzerRule for ResolveStar {
    fn name(&self) -> &'static str {
        "resolve_star"
    }

    fn apply(
        &self,
        _ctx: &ExecutionContext,
        _analyzer: &Analyzer,
        scope: &Scope,
        plan: LogicalOperator,
    ) -> Result<Transformed<LogicalOperator>> {
        plan.transform_up(&mut |node| match node {
            LogicalOperator::Project(project)
                if project.children.iter().all(|c| c.resolved())
                    && project
                        .node
                        .projections
                        .iter()
                        .any(|expr| matches!(expr, Expression::Star(_))) =>
            {
                expand_stars(project, scope).map(Transformed::yes)
            }
            other => Ok(Transformed::no(other)),
        })
    }
}

fn expand_stars(mut project: Node<LogicalProject>, scope: &Scope) -> Result<LogicalOperator> {
    let input = project.get_one_child_exact()?.schema()?;
    let offset = scope.width();

    let mut projections = Vec::with_capacity(project.node.projections.len());
    for expr in std::mem::take(&mut project.node.projections) {
        let Expression::Star(star) = expr else {
            projections.push(expr);
            continue;
        };

        let qualifier = star.qualifier.as_deref();
        let before = projections.len();
        projections.extend(
            input
                .iter()
                .enumerate()
                .filter(|(_, c)| qualifier.is_none_or(|q| c.source.eq_ignore_ascii_case(q)))
                .map(|(idx, c)| Expression::Column(ColumnExpr::from_column(offset + idx, c))),
        );

        if let Some(qualifier) = qualifier.filter(|_| projections.len() == before) {
            return Err(DbError::unresolved(EntityKind::Table, qualifier));
        }
    }

    project.node.projections = projections;
    Ok(LogicalOperator::Project(project))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::rules::resolve_tables::ResolveTables;
    use crate::analyzer::rules::testutil::{test_analyzer, test_context};
    use crate::expr::{qualified_star, star, unresolved_col};
    use crate::logical::builder::{cross_join, project, unresolved_table};
    use crate::types::datatype::DataType;
    use crate::types::schema::Column;

    fn resolve(plan: LogicalOperator, scope: &Scope) -> Result<LogicalOperator> {
        let analyzer = test_analyzer();
        let ctx = test_context();
        let plan = ResolveTables
            .apply(&ctx, &analyzer, scope, plan)?
            .into_inner();
        Ok(ResolveStar.apply(&ctx, &analyzer, scope, plan)?.into_inner())
    }

    fn projection_names(plan: &LogicalOperator) -> Vec<(String, usize)> {
        let LogicalOperator::Project(project) = plan else {
            panic!("expected project");
        };
        project
            .node
            .projections
            .iter()
            .map(|expr| match expr {
                Expression::Column(col) => (col.name.clone(), col.index),
                other => panic!("unexpected expression {other}"),
            })
            .collect()
    }

    #[test]
    fn expands_star() {
        let plan = resolve(
            project(
                vec![star()],
                cross_join(unresolved_table("mytable"), unresolved_table("othertable")),
            ),
            &Scope::empty(),
        )
        .unwrap();

        assert_eq!(
            vec![
                ("i".to_string(), 0),
                ("s".to_string(), 1),
                ("s2".to_string(), 2),
                ("i2".to_string(), 3)
            ],
            projection_names(&plan)
        );
    }

    #[test]
    fn expands_qualified_star_with_scope_offset() {
        let scope = Scope::empty().nested(
            [Column::new("outer", DataType::Int64, false)]
                .into_iter()
                .collect(),
        );
        let plan = resolve(
            project(
                vec![qualified_star("othertable")],
                cross_join(unresolved_table("mytable"), unresolved_table("othertable")),
            ),
            &scope,
        )
        .unwrap();

        assert_eq!(
            vec![("s2".to_string(), 3), ("i2".to_string(), 4)],
            projection_names(&plan)
        );
    }

    #[test]
    fn unknown_qualifier_errors() {
        let err = resolve(
            project(vec![qualified_star("nope")], unresolved_table("mytable")),
            &Scope::empty(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DbError::UnresolvedEntity { kind: EntityKind::Table, name } if name == "nope"
        ));
    }

    #[test]
    fn waits_for_resolved_input() {
        let analyzer = test_analyzer();
        let plan = project(vec![star(), unresolved_col("i")], unresolved_table("mytable"));
        let transformed = ResolveStar
            .apply(&test_context(), &analyzer, &Scope::empty(), plan.clone())
            .unwrap();
        assert!(!transformed.changed);
        assert_eq!(plan, transformed.node);
    }
}
