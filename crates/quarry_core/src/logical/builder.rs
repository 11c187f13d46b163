//! Constructors for plan nodes, mostly for use by a parser front-end and tests.

use uuid::Uuid;

use super::logical_aggregate::LogicalGroupBy;
use super::logical_create::LogicalCreateTable;
use super::logical_filter::LogicalFilter;
use super::logical_join::{LogicalCrossJoin, LogicalInnerJoin};
use super::logical_process::QueryProcess;
use super::logical_project::LogicalProject;
use super::logical_subquery_alias::SubqueryAlias;
use super::logical_table::UnresolvedTable;
use super::logical_values::LogicalValues;
use super::operator::{LogicalOperator, Node};
use crate::catalog::OnConflict;
use crate::expr::Expression;
use crate::types::schema::Schema;

pub fn unresolved_table(name: impl Into<String>) -> LogicalOperator {
    LogicalOperator::UnresolvedTable(Node::new(
        UnresolvedTable {
            database: None,
            name: name.into(),
            as_of: None,
        },
        Vec::new(),
    ))
}

pub fn unresolved_table_in(database: impl Into<String>, name: impl Into<String>) -> LogicalOperator {
    LogicalOperator::UnresolvedTable(Node::new(
        UnresolvedTable {
            database: Some(database.into()),
            name: name.into(),
            as_of: None,
        },
        Vec::new(),
    ))
}

pub fn unresolved_table_as_of(name: impl Into<String>, as_of: Expression) -> LogicalOperator {
    LogicalOperator::UnresolvedTable(Node::new(
        UnresolvedTable {
            database: None,
            name: name.into(),
            as_of: Some(as_of),
        },
        Vec::new(),
    ))
}

pub fn values(rows: Vec<Vec<Expression>>) -> LogicalOperator {
    LogicalOperator::Values(Node::new(LogicalValues { rows }, Vec::new()))
}

pub fn project(projections: Vec<Expression>, input: LogicalOperator) -> LogicalOperator {
    LogicalOperator::Project(Node::new(LogicalProject { projections }, vec![input]))
}

pub fn filter(filter: Expression, input: LogicalOperator) -> LogicalOperator {
    LogicalOperator::Filter(Node::new(LogicalFilter { filter }, vec![input]))
}

pub fn cross_join(left: LogicalOperator, right: LogicalOperator) -> LogicalOperator {
    LogicalOperator::CrossJoin(Node::new(LogicalCrossJoin, vec![left, right]))
}

pub fn inner_join(
    left: LogicalOperator,
    right: LogicalOperator,
    condition: Expression,
) -> LogicalOperator {
    LogicalOperator::InnerJoin(Node::new(LogicalInnerJoin { condition }, vec![left, right]))
}

pub fn group_by(
    selected: Vec<Expression>,
    grouping: Vec<Expression>,
    input: LogicalOperator,
) -> LogicalOperator {
    LogicalOperator::GroupBy(Node::new(LogicalGroupBy { selected, grouping }, vec![input]))
}

pub fn subquery_alias(alias: impl Into<String>, input: LogicalOperator) -> LogicalOperator {
    LogicalOperator::SubqueryAlias(Node::new(
        SubqueryAlias {
            alias: alias.into(),
        },
        vec![input],
    ))
}

pub fn create_table(
    name: impl Into<String>,
    columns: Schema,
    select: Option<LogicalOperator>,
) -> LogicalOperator {
    LogicalOperator::CreateTable(Node::new(
        LogicalCreateTable {
            database: None,
            name: name.into(),
            columns,
            on_conflict: OnConflict::Error,
        },
        select.into_iter().collect(),
    ))
}

pub fn query_process(query_id: Uuid, input: LogicalOperator) -> LogicalOperator {
    LogicalOperator::QueryProcess(Node::new(QueryProcess { query_id }, vec![input]))
}
