//! Materializing interpreter for resolved plans.
//!
//! Every operator produces all of its rows before its parent runs.

use std::borrow::Cow;

use indexmap::IndexMap;
use quarry_error::{eval_error, internal, not_implemented, DbError, EntityKind, Result};
use tracing::{debug, trace};

use crate::catalog::Catalog;
use crate::context::ExecutionContext;
use crate::expr::aggregate_expr::AggregateExpr;
use crate::expr::Expression;
use crate::functions::aggregate::AggregationBuffer;
use crate::logical::logical_aggregate::LogicalGroupBy;
use crate::logical::logical_create::LogicalCreateTable;
use crate::logical::operator::{LogicalOperator, Node};
use crate::types::scalar::ScalarValue;
use crate::types::Row;

/// Execute a resolved plan, returning all output rows.
pub fn execute(
    ctx: &ExecutionContext,
    catalog: &Catalog,
    plan: &LogicalOperator,
) -> Result<Vec<Row>> {
    execute_with_outer(ctx, catalog, plan, &[])
}

/// Execute a plan analyzed under a scope.
///
/// `outer` is the scope row. Expressions in the plan index into `outer`
/// followed by the local row.
pub fn execute_with_outer(
    ctx: &ExecutionContext,
    catalog: &Catalog,
    plan: &LogicalOperator,
    outer: &[ScalarValue],
) -> Result<Vec<Row>> {
    let rows = Executor { ctx, catalog }.execute(plan, outer)?;
    debug!(query_id = %ctx.query_id(), rows = rows.len(), "executed plan");
    Ok(rows)
}

struct Executor<'a> {
    ctx: &'a ExecutionContext,
    catalog: &'a Catalog,
}

impl Executor<'_> {
    fn execute(&self, plan: &LogicalOperator, outer: &[ScalarValue]) -> Result<Vec<Row>> {
        self.ctx.check_cancelled()?;
        trace!(operator = plan.name(), "executing operator");

        match plan {
            LogicalOperator::UnresolvedTable(table) => Err(DbError::unresolved(
                EntityKind::Table,
                table.node.qualified_name(),
            )),
            LogicalOperator::ResolvedTable(table) => table.node.table.scan(),
            LogicalOperator::Values(values) => values
                .node
                .rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|expr| expr.eval(self.ctx, outer))
                        .collect::<Result<Row>>()
                })
                .collect(),
            LogicalOperator::Project(project) => {
                let input = self.execute(project.get_one_child_exact()?, outer)?;
                input
                    .iter()
                    .map(|row| {
                        let row = with_outer(outer, row);
                        project
                            .node
                            .projections
                            .iter()
                            .map(|expr| expr.eval(self.ctx, &row))
                            .collect::<Result<Row>>()
                    })
                    .collect()
            }
            LogicalOperator::Filter(filter) => {
                let input = self.execute(filter.get_one_child_exact()?, outer)?;
                let mut output = Vec::new();
                for row in input {
                    if self.is_true(&filter.node.filter, outer, &row)? {
                        output.push(row);
                    }
                }
                Ok(output)
            }
            LogicalOperator::CrossJoin(join) => {
                let left = self.execute(join.get_nth_child(0)?, outer)?;
                let right = self.execute(join.get_nth_child(1)?, outer)?;
                Ok(cross_product(&left, &right))
            }
            LogicalOperator::InnerJoin(join) => {
                let left = self.execute(join.get_nth_child(0)?, outer)?;
                let right = self.execute(join.get_nth_child(1)?, outer)?;
                let mut output = Vec::new();
                for row in cross_product(&left, &right) {
                    if self.is_true(&join.node.condition, outer, &row)? {
                        output.push(row);
                    }
                }
                Ok(output)
            }
            LogicalOperator::GroupBy(group_by) => self.execute_group_by(group_by, outer),
            LogicalOperator::SubqueryAlias(alias) => {
                self.execute(alias.get_one_child_exact()?, outer)
            }
            LogicalOperator::QueryProcess(process) => {
                self.execute(process.get_one_child_exact()?, outer)
            }
            LogicalOperator::CreateTable(create) => self.execute_create_table(create, outer),
        }
    }

    /// If the predicate evaluates to exactly TRUE. NULL and FALSE both reject
    /// the row.
    fn is_true(
        &self,
        predicate: &Expression,
        outer: &[ScalarValue],
        row: &[ScalarValue],
    ) -> Result<bool> {
        let row = with_outer(outer, row);
        Ok(predicate.eval(self.ctx, &row)?.try_as_bool()? == Some(true))
    }

    fn execute_group_by(
        &self,
        group_by: &Node<LogicalGroupBy>,
        outer: &[ScalarValue],
    ) -> Result<Vec<Row>> {
        let input = self.execute(group_by.get_one_child_exact()?, outer)?;
        let selected = group_by
            .node
            .selected
            .iter()
            .map(SelectedExpr::try_from_expr)
            .collect::<Result<Vec<_>>>()?;

        let mut groups: IndexMap<Vec<ScalarValue>, Group> = IndexMap::new();
        for row in &input {
            let row = with_outer(outer, row);
            let key = group_by
                .node
                .grouping
                .iter()
                .map(|expr| expr.eval(self.ctx, &row))
                .collect::<Result<Vec<_>>>()?;

            let group = groups
                .entry(key)
                .or_insert_with(|| Group::new(&selected, Some(row.to_vec())));
            for (expr, buffer) in selected.iter().zip(group.buffers.iter_mut()) {
                if let (SelectedExpr::Aggregate(agg), Some(buffer)) = (expr, buffer) {
                    agg.update(self.ctx, buffer, &row)?;
                }
            }
        }

        // A global aggregate produces a row even without any input.
        if groups.is_empty() && group_by.node.grouping.is_empty() {
            groups.insert(Vec::new(), Group::new(&selected, None));
        }

        trace!(groups = groups.len(), "aggregated groups");

        groups
            .into_values()
            .map(|group| {
                selected
                    .iter()
                    .zip(&group.buffers)
                    .map(|(expr, buffer)| match (expr, buffer) {
                        (SelectedExpr::Aggregate(agg), Some(buffer)) => agg.eval(self.ctx, buffer),
                        (SelectedExpr::Plain(expr), None) => match &group.first {
                            Some(first) => expr.eval(self.ctx, first),
                            None => Ok(ScalarValue::Null),
                        },
                        _ => Err(internal!("aggregate buffer mismatch for '{expr:?}'")),
                    })
                    .collect::<Result<Row>>()
            })
            .collect()
    }

    fn execute_create_table(
        &self,
        create: &Node<LogicalCreateTable>,
        outer: &[ScalarValue],
    ) -> Result<Vec<Row>> {
        let columns = &create.node.columns;

        let rows = match create.children.first() {
            Some(select) => {
                let select_schema = select.schema()?;
                // Position in the select output for each table column.
                let mapping: Vec<_> = columns
                    .iter()
                    .map(|c| select_schema.index_of(&c.name))
                    .collect();

                self.execute(select, outer)?
                    .into_iter()
                    .map(|row| {
                        columns
                            .iter()
                            .zip(&mapping)
                            .map(|(column, idx)| {
                                let value = match idx {
                                    Some(idx) => row
                                        .get(*idx)
                                        .ok_or_else(|| {
                                            internal!("select row missing column {idx}")
                                        })?
                                        .cast_to(&column.datatype)?,
                                    None => match &column.default {
                                        Some(default) => default.cast_to(&column.datatype)?,
                                        None => ScalarValue::Null,
                                    },
                                };
                                if value.is_null() && !column.nullable {
                                    return Err(eval_error!(
                                        "NULL value for non-nullable column '{}'",
                                        column.name
                                    ));
                                }
                                Ok(value)
                            })
                            .collect::<Result<Row>>()
                    })
                    .collect::<Result<Vec<_>>>()?
            }
            None => Vec::new(),
        };

        let database_name = create
            .node
            .database
            .as_deref()
            .unwrap_or(self.ctx.current_database());
        let database = self.catalog.database(database_name)?;

        let inserted = match database.create_table(
            &create.node.name,
            columns.clone(),
            create.node.on_conflict,
        )? {
            Some(table) => table.insert(rows)?,
            None => {
                debug!(table = %create.node.name, "table exists, skipping create");
                0
            }
        };

        Ok(vec![vec![ScalarValue::UInt64(inserted)]])
    }
}

/// An expression in a GROUP BY select list.
#[derive(Debug)]
enum SelectedExpr<'a> {
    Aggregate(&'a AggregateExpr),
    /// Evaluated against the first row of each group.
    Plain(&'a Expression),
}

impl<'a> SelectedExpr<'a> {
    fn try_from_expr(expr: &'a Expression) -> Result<Self> {
        match expr.unalias() {
            Expression::Aggregate(agg) => Ok(SelectedExpr::Aggregate(agg)),
            other if other.contains_aggregate() => {
                not_implemented!("aggregate nested inside expression '{other}'")
            }
            other => Ok(SelectedExpr::Plain(other)),
        }
    }
}

#[derive(Debug)]
struct Group {
    /// First input row of the group, with the outer row prefix.
    first: Option<Row>,
    /// One buffer per selected aggregate, `None` for plain expressions.
    buffers: Vec<Option<AggregationBuffer>>,
}

impl Group {
    fn new(selected: &[SelectedExpr<'_>], first: Option<Row>) -> Self {
        let buffers = selected
            .iter()
            .map(|expr| match expr {
                SelectedExpr::Aggregate(agg) => Some(agg.new_buffer()),
                SelectedExpr::Plain(_) => None,
            })
            .collect();
        Group { first, buffers }
    }
}

fn with_outer<'a>(outer: &[ScalarValue], row: &'a [ScalarValue]) -> Cow<'a, [ScalarValue]> {
    if outer.is_empty() {
        Cow::Borrowed(row)
    } else {
        Cow::Owned(outer.iter().chain(row).cloned().collect())
    }
}

fn cross_product(left: &[Row], right: &[Row]) -> Vec<Row> {
    let mut output = Vec::with_capacity(left.len() * right.len());
    for l in left {
        for r in right {
            output.push(l.iter().chain(r).cloned().collect());
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::rules::testutil::{test_analyzer, test_context};
    use crate::analyzer::scope::Scope;
    use crate::catalog::OnConflict;
    use crate::expr::{alias, and, eq, is_null, lit, max, min, min_distinct, unresolved_col};
    use crate::logical::builder::{
        create_table, cross_join, filter, group_by, inner_join, project, unresolved_table, values,
    };
    use crate::types::datatype::DataType;
    use crate::types::schema::{Column, Schema};

    fn run(plan: LogicalOperator) -> Result<Vec<Row>> {
        let analyzer = test_analyzer();
        let ctx = test_context();
        let plan = analyzer.analyze(&ctx, plan)?;
        execute(&ctx, analyzer.catalog(), &plan)
    }

    #[test]
    fn filter_keeps_only_true() {
        let rows = run(project(
            vec![unresolved_col("s")],
            filter(
                // NULL for every row; nothing should pass.
                and(eq(unresolved_col("i"), lit(2_i64)), lit(ScalarValue::Null)),
                unresolved_table("mytable"),
            ),
        ))
        .unwrap();
        assert!(rows.is_empty());

        let rows = run(project(
            vec![unresolved_col("s")],
            filter(eq(unresolved_col("i"), lit(2_i64)), unresolved_table("mytable")),
        ))
        .unwrap();
        assert_eq!(vec![vec![ScalarValue::from("second row")]], rows);
    }

    #[test]
    fn cross_and_inner_join() {
        let rows = run(cross_join(
            values(vec![vec![lit(1_i64)], vec![lit(2_i64)]]),
            values(vec![vec![lit("a")], vec![lit("b")]]),
        ))
        .unwrap();
        assert_eq!(4, rows.len());
        assert_eq!(vec![ScalarValue::Int64(1), ScalarValue::from("b")], rows[1]);

        let rows = run(project(
            vec![unresolved_col("s")],
            inner_join(
                unresolved_table("mytable"),
                values(vec![vec![lit(3_i64)]]),
                eq(unresolved_col("i"), unresolved_col("column1")),
            ),
        ))
        .unwrap();
        assert_eq!(vec![vec![ScalarValue::from("third row")]], rows);
    }

    #[test]
    fn grouped_min_max_first_seen_order() {
        let input = values(vec![
            vec![lit("b"), lit(3_i64)],
            vec![lit("a"), lit(5_i64)],
            vec![lit("b"), lit(1_i64)],
            vec![lit("a"), lit(ScalarValue::Null)],
        ]);
        let rows = run(group_by(
            vec![
                unresolved_col("column1"),
                alias(min(unresolved_col("column2")), "lo"),
                max(unresolved_col("column2")),
            ],
            vec![unresolved_col("column1")],
            input,
        ))
        .unwrap();

        assert_eq!(
            vec![
                vec![ScalarValue::from("b"), ScalarValue::Int64(1), ScalarValue::Int64(3)],
                vec![ScalarValue::from("a"), ScalarValue::Int64(5), ScalarValue::Int64(5)],
            ],
            rows
        );
    }

    #[test]
    fn global_aggregate_over_empty_input() {
        let rows = run(group_by(
            vec![min_distinct(unresolved_col("i"))],
            Vec::new(),
            filter(lit(false), unresolved_table("mytable")),
        ))
        .unwrap();
        assert_eq!(vec![vec![ScalarValue::Null]], rows);
    }

    #[test]
    fn grouped_aggregate_over_empty_input() {
        let rows = run(group_by(
            vec![min(unresolved_col("i"))],
            vec![unresolved_col("s")],
            filter(lit(false), unresolved_table("mytable")),
        ))
        .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn nested_aggregate_not_implemented() {
        let err = run(group_by(
            vec![is_null(min(unresolved_col("i")))],
            Vec::new(),
            unresolved_table("mytable"),
        ))
        .unwrap_err();
        assert!(matches!(err, DbError::NotImplemented(_)));
    }

    #[test]
    fn unresolved_plan_fails() {
        let ctx = test_context();
        let analyzer = test_analyzer();
        let err = execute(&ctx, analyzer.catalog(), &unresolved_table("mytable")).unwrap_err();
        assert!(matches!(err, DbError::UnresolvedEntity { .. }));
    }

    #[test]
    fn outer_row_prefix() {
        let analyzer = test_analyzer();
        let ctx = test_context();
        let scope =
            Scope::empty().nested(Schema::new([Column::new("o", DataType::Int64, false)]));

        let plan = analyzer
            .analyze_with_scope(
                &ctx,
                project(
                    vec![unresolved_col("o"), unresolved_col("s")],
                    filter(
                        eq(unresolved_col("i"), unresolved_col("o")),
                        unresolved_table("mytable"),
                    ),
                ),
                &scope,
            )
            .unwrap();

        let rows =
            execute_with_outer(&ctx, analyzer.catalog(), &plan, &[ScalarValue::Int64(3)]).unwrap();
        assert_eq!(
            vec![vec![ScalarValue::Int64(3), ScalarValue::from("third row")]],
            rows
        );
    }

    #[test]
    fn create_table_conflict_ignored() {
        let analyzer = test_analyzer();
        let ctx = test_context();
        let db = analyzer.catalog().database("mydb").unwrap();
        db.create_table(
            "existing",
            Schema::new([Column::new("a", DataType::Int64, true)]),
            OnConflict::Error,
        )
        .unwrap();

        let mut create = create_table(
            "existing",
            Schema::new([Column::new("a", DataType::Int64, true)]),
            None,
        );
        if let LogicalOperator::CreateTable(node) = &mut create {
            node.node.on_conflict = OnConflict::Ignore;
        }

        let plan = analyzer.analyze(&ctx, create).unwrap();
        let rows = execute(&ctx, analyzer.catalog(), &plan).unwrap();
        assert_eq!(vec![vec![ScalarValue::UInt64(0)]], rows);
    }
}
