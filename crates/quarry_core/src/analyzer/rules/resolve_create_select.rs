use quarry_error::{DbError, Result};
use tracing::debug;

use crate::analyzer::scope::Scope;
use crate::analyzer::{Analyzer, AnalyzerRule};
use crate::context::ExecutionContext;
use crate::logical::logical_create::LogicalCreateTable;
use crate::logical::operator::{LogicalOperator, Node};
use crate::tree::{Transformed, TreeNode};
use crate::types::schema::{Column, Schema};

/// Analyzes the SELECT of a CREATE TABLE ... AS SELECT and merges its output
/// columns with the explicitly declared ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveCreateSelect;

impl AnalyzerRule for ResolveCreateSelect {
    fn name(&self) -> &'static str {
        "resolve_create_select"
    }

    fn apply(
        &self,
        ctx: &ExecutionContext,
        analyzer: &Analyzer,
        scope: &Scope,
        plan: LogicalOperator,
    ) -> Result<Transformed<LogicalOperator>> {
        plan.transform_up(&mut |node| match node {
            LogicalOperator::CreateTable(create) if create.children.len() == 1 => {
                resolve_create_select(ctx, analyzer, scope, create).map(Transformed::yes)
            }
            other => Ok(Transformed::no(other)),
        })
    }
}

fn resolve_create_select(
    ctx: &ExecutionContext,
    analyzer: &Analyzer,
    scope: &Scope,
    mut create: Node<LogicalCreateTable>,
) -> Result<LogicalOperator> {
    let select = create.take_one_child_exact()?;
    let select = analyzer.analyze_with_scope(ctx, select, scope)?;

    // The nested analysis tracks the select as its own query. The CREATE is
    // tracked as a whole instead.
    let select = match select {
        LogicalOperator::QueryProcess(mut process) => process.take_one_child_exact()?,
        other => other,
    };

    let merged = merge_schemas(&create.node.name, &create.node.columns, &select.schema()?)?;
    debug!(
        table = %create.node.name,
        columns = ?merged.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        "merged create table schema"
    );

    create.node.columns = merged;
    create.children = vec![select];

    Ok(LogicalOperator::CreateTable(create))
}

/// Merge explicitly declared columns with the columns produced by a SELECT.
///
/// Output order is declared-only columns, then columns present in both (using
/// the declared definition), then select-only columns. Every column's source
/// becomes `table`.
pub fn merge_schemas(table: &str, declared: &Schema, select: &Schema) -> Result<Schema> {
    let mut declared_only = Vec::new();
    let mut both = Vec::new();

    for column in declared {
        match select.iter().find(|c| c.name == column.name) {
            Some(selected) => {
                if !selected.datatype.can_coerce_to(&column.datatype) {
                    return Err(DbError::SchemaMismatch {
                        column: column.name.clone(),
                        expected: column.datatype.to_string(),
                        found: selected.datatype.to_string(),
                    });
                }
                both.push(column.clone());
            }
            None => declared_only.push(column.clone()),
        }
    }

    let select_only = select
        .iter()
        .filter(|c| !declared.contains(&c.name))
        .map(|c| Column {
            default: None,
            ..c.clone()
        });

    Ok(declared_only
        .into_iter()
        .chain(both)
        .chain(select_only)
        .map(|c| c.with_source(table))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::rules::testutil::{test_analyzer, test_context};
    use crate::expr::{alias, lit, unresolved_col};
    use crate::logical::builder::{create_table, project, unresolved_table};
    use crate::types::datatype::DataType;
    use crate::types::scalar::ScalarValue;

    fn schema(columns: &[(&str, DataType)]) -> Schema {
        columns
            .iter()
            .map(|(name, dt)| Column::new(*name, *dt, true))
            .collect()
    }

    fn names(schema: &Schema) -> Vec<&str> {
        schema.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn merge_identical() {
        let cols = schema(&[("foo", DataType::Int64), ("baz", DataType::Utf8)]);
        let merged = merge_schemas("t", &cols, &cols).unwrap();
        assert_eq!(vec!["foo", "baz"], names(&merged));
        assert!(merged.iter().all(|c| c.source == "t"));
    }

    #[test]
    fn merge_disjoint_ordering() {
        let declared = schema(&[("x", DataType::Int64), ("foo", DataType::Int64)]);
        let select = schema(&[("foo", DataType::Int32), ("y", DataType::Utf8)]);

        let merged = merge_schemas("t", &declared, &select).unwrap();
        assert_eq!(vec!["x", "foo", "y"], names(&merged));
        // Declared definition wins for shared columns.
        assert_eq!(DataType::Int64, merged.columns[1].datatype);
        assert_eq!(DataType::Utf8, merged.columns[2].datatype);
    }

    #[test]
    fn merge_keeps_declared_default() {
        let declared = Schema::new([
            Column::new("a", DataType::Int64, false).with_default(ScalarValue::Int64(7)),
        ]);
        let merged = merge_schemas("t", &declared, &Schema::empty()).unwrap();
        assert_eq!(Some(ScalarValue::Int64(7)), merged.columns[0].default);
    }

    #[test]
    fn merge_incompatible_type() {
        let declared = schema(&[("foo", DataType::Int64)]);
        let select = schema(&[("foo", DataType::Binary)]);

        let err = merge_schemas("t", &declared, &select).unwrap_err();
        assert!(matches!(err, DbError::SchemaMismatch { column, .. } if column == "foo"));
    }

    #[test]
    fn resolves_select_and_merges() {
        let analyzer = test_analyzer();
        let ctx = test_context();

        let plan = create_table(
            "newtable",
            schema(&[("extra", DataType::Utf8), ("i", DataType::Int64)]),
            Some(project(
                vec![unresolved_col("i"), alias(lit(1_i64), "one")],
                unresolved_table("mytable"),
            )),
        );

        let transformed = ResolveCreateSelect
            .apply(&ctx, &analyzer, &Scope::empty(), plan)
            .unwrap();
        assert!(transformed.changed);

        let LogicalOperator::CreateTable(create) = transformed.node else {
            panic!("expected create table");
        };
        assert_eq!(vec!["extra", "i", "one"], names(&create.node.columns));
        assert!(create.node.columns.iter().all(|c| c.source == "newtable"));

        let select = create.get_one_child_exact().unwrap();
        assert!(select.resolved());
        assert!(!matches!(select, LogicalOperator::QueryProcess(_)));
    }

    #[test]
    fn create_without_select_untouched() {
        let analyzer = test_analyzer();
        let plan = create_table("t", schema(&[("a", DataType::Int64)]), None);

        let transformed = ResolveCreateSelect
            .apply(&test_context(), &analyzer, &Scope::empty(), plan.clone())
            .unwrap();
        assert!(!transformed.changed);
        assert_eq!(plan, transformed.node);
    }
}
