use std::fmt;

use quarry_error::{internal, EntityKind, Result};

use super::logical_aggregate::LogicalGroupBy;
use super::logical_create::LogicalCreateTable;
use super::logical_filter::LogicalFilter;
use super::logical_join::{LogicalCrossJoin, LogicalInnerJoin};
use super::logical_process::QueryProcess;
use super::logical_project::LogicalProject;
use super::logical_subquery_alias::SubqueryAlias;
use super::logical_table::{ResolvedTable, UnresolvedTable};
use super::logical_values::LogicalValues;
use crate::expr::Expression;
use crate::tree::walk;
use crate::tree::{Transformed, TreeNode};
use crate::types::schema::Schema;

/// Common operations across all logical nodes in a plan.
///
/// For individual operators, this should be implemented on `Node<T>` and not
/// `T`.
pub trait LogicalNode {
    /// Name of the operator.
    fn name(&self) -> &'static str;

    /// Output schema of the operator.
    ///
    /// Computed from the children on every call.
    fn schema(&self) -> Result<Schema>;

    fn for_each_expr<'a, F>(&'a self, func: F)
    where
        F: FnMut(&'a Expression);

    /// Rebuild the operator by passing each of its expressions through `func`.
    fn map_exprs<F>(self, func: F) -> Result<Transformed<Self>>
    where
        Self: Sized,
        F: FnMut(Expression) -> Result<Transformed<Expression>>;
}

/// Wrapper around nodes in the logical plan holding the node's inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Node<N> {
    /// Node specific logic.
    pub node: N,
    /// Inputs to this node.
    pub children: Vec<LogicalOperator>,
}

impl<N> Node<N> {
    pub fn new(node: N, children: Vec<LogicalOperator>) -> Self {
        Node { node, children }
    }

    pub fn into_inner(self) -> N {
        self.node
    }

    pub fn get_one_child_exact(&self) -> Result<&LogicalOperator> {
        if self.children.len() != 1 {
            return Err(internal!(
                "Expected 1 child to operator, have {}",
                self.children.len()
            ));
        }
        Ok(&self.children[0])
    }

    pub fn get_nth_child(&self, n: usize) -> Result<&LogicalOperator> {
        self.children.get(n).ok_or_else(|| {
            internal!(
                "Expected at least {} children, got {}",
                n + 1,
                self.children.len()
            )
        })
    }

    pub fn take_one_child_exact(&mut self) -> Result<LogicalOperator> {
        if self.children.len() != 1 {
            return Err(internal!(
                "Expected 1 child to operator, have {}",
                self.children.len()
            ));
        }
        self.children
            .pop()
            .ok_or_else(|| internal!("Missing child for operator"))
    }

    /// Concatenated schemas of all children, in order.
    pub fn children_schema(&self) -> Result<Schema> {
        let schemas = self
            .children
            .iter()
            .map(|child| child.schema())
            .collect::<Result<Vec<_>>>()?;
        Ok(Schema::merge(schemas))
    }

    pub fn map_children<F>(self, mut f: F) -> Result<Transformed<Self>>
    where
        F: FnMut(LogicalOperator) -> Result<Transformed<LogicalOperator>>,
    {
        let mut changed = false;
        let children = self
            .children
            .into_iter()
            .map(|child| {
                let transformed = f(child)?;
                changed |= transformed.changed;
                Ok(transformed.node)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Transformed::new(
            Node {
                node: self.node,
                children,
            },
            changed,
        ))
    }
}

impl<N> AsRef<N> for Node<N> {
    fn as_ref(&self) -> &N {
        &self.node
    }
}

impl<N> AsMut<N> for Node<N> {
    fn as_mut(&mut self) -> &mut N {
        &mut self.node
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogicalOperator {
    UnresolvedTable(Node<UnresolvedTable>),
    ResolvedTable(Node<ResolvedTable>),
    Values(Node<LogicalValues>),
    Project(Node<LogicalProject>),
    Filter(Node<LogicalFilter>),
    CrossJoin(Node<LogicalCrossJoin>),
    InnerJoin(Node<LogicalInnerJoin>),
    GroupBy(Node<LogicalGroupBy>),
    SubqueryAlias(Node<SubqueryAlias>),
    CreateTable(Node<LogicalCreateTable>),
    QueryProcess(Node<QueryProcess>),
}

/// Dispatch a method call to the node wrapped by each variant.
macro_rules! dispatch {
    ($op:expr, $node:ident => $body:expr) => {
        match $op {
            LogicalOperator::UnresolvedTable($node) => $body,
            LogicalOperator::ResolvedTable($node) => $body,
            LogicalOperator::Values($node) => $body,
            LogicalOperator::Project($node) => $body,
            LogicalOperator::Filter($node) => $body,
            LogicalOperator::CrossJoin($node) => $body,
            LogicalOperator::InnerJoin($node) => $body,
            LogicalOperator::GroupBy($node) => $body,
            LogicalOperator::SubqueryAlias($node) => $body,
            LogicalOperator::CreateTable($node) => $body,
            LogicalOperator::QueryProcess($node) => $body,
        }
    };
}

/// Like `dispatch`, but rewraps the returned node in its variant.
macro_rules! dispatch_rewrap {
    ($op:expr, $node:ident => $body:expr) => {
        match $op {
            LogicalOperator::UnresolvedTable($node) => {
                $body.map(|t| t.map(LogicalOperator::UnresolvedTable))
            }
            LogicalOperator::ResolvedTable($node) => {
                $body.map(|t| t.map(LogicalOperator::ResolvedTable))
            }
            LogicalOperator::Values($node) => $body.map(|t| t.map(LogicalOperator::Values)),
            LogicalOperator::Project($node) => $body.map(|t| t.map(LogicalOperator::Project)),
            LogicalOperator::Filter($node) => $body.map(|t| t.map(LogicalOperator::Filter)),
            LogicalOperator::CrossJoin($node) => $body.map(|t| t.map(LogicalOperator::CrossJoin)),
            LogicalOperator::InnerJoin($node) => $body.map(|t| t.map(LogicalOperator::InnerJoin)),
            LogicalOperator::GroupBy($node) => $body.map(|t| t.map(LogicalOperator::GroupBy)),
            LogicalOperator::SubqueryAlias($node) => {
                $body.map(|t| t.map(LogicalOperator::SubqueryAlias))
            }
            LogicalOperator::CreateTable($node) => {
                $body.map(|t| t.map(LogicalOperator::CreateTable))
            }
            LogicalOperator::QueryProcess($node) => {
                $body.map(|t| t.map(LogicalOperator::QueryProcess))
            }
        }
    };
}

impl LogicalOperator {
    pub fn name(&self) -> &'static str {
        dispatch!(self, n => n.name())
    }

    pub fn schema(&self) -> Result<Schema> {
        dispatch!(self, n => n.schema())
    }

    pub fn for_each_expr<'a, F>(&'a self, func: F)
    where
        F: FnMut(&'a Expression),
    {
        dispatch!(self, n => n.for_each_expr(func))
    }

    /// Rebuild this operator by passing each of its own expressions (not its
    /// children's) through `func`.
    pub fn map_expressions<F>(self, func: F) -> Result<Transformed<Self>>
    where
        F: FnMut(Expression) -> Result<Transformed<Expression>>,
    {
        dispatch_rewrap!(self, n => n.map_exprs(func))
    }

    pub fn children_ref(&self) -> &[LogicalOperator] {
        dispatch!(self, n => &n.children)
    }

    /// If this operator itself, ignoring children, is resolved.
    pub fn node_resolved(&self) -> bool {
        if matches!(self, LogicalOperator::UnresolvedTable(_)) {
            return false;
        }
        let mut resolved = true;
        self.for_each_expr(|expr| resolved &= expr.resolved());
        resolved
    }

    /// If all children of this operator are resolved.
    pub fn children_resolved(&self) -> bool {
        self.children_ref().iter().all(|child| child.resolved())
    }

    /// Find the first entity that hasn't been resolved.
    ///
    /// Children are searched before the operator's own expressions, so a
    /// missing table is reported instead of the columns that depend on it.
    pub fn first_unresolved(&self) -> Option<(EntityKind, String)> {
        if let Some(found) = self.children_ref().iter().find_map(|c| c.first_unresolved()) {
            return Some(found);
        }
        if let LogicalOperator::UnresolvedTable(table) = self {
            return Some((EntityKind::Table, table.node.qualified_name()));
        }

        let mut found = None;
        self.for_each_expr(|expr| {
            if found.is_none() {
                found = walk::find(expr, |e| !e.node_resolved())
                    .map(|e| (EntityKind::Column, e.to_string()));
            }
        });
        found
    }

    /// Render the plan as an indented tree.
    pub fn explain(&self) -> String {
        let mut buf = String::new();
        self.explain_inner(0, &mut buf);
        buf
    }

    fn explain_inner(&self, depth: usize, buf: &mut String) {
        buf.push_str(&"  ".repeat(depth));
        buf.push_str(&self.to_string());
        buf.push('\n');
        for child in self.children_ref() {
            child.explain_inner(depth + 1, buf);
        }
    }
}

impl Expression {
    /// If this expression node itself, ignoring children, is resolved.
    fn node_resolved(&self) -> bool {
        !matches!(self, Expression::UnresolvedColumn(_) | Expression::Star(_))
    }
}

impl TreeNode for LogicalOperator {
    fn children(&self) -> Vec<&Self> {
        self.children_ref().iter().collect()
    }

    fn resolved(&self) -> bool {
        self.node_resolved() && self.children_resolved()
    }

    fn map_children<F>(self, f: F) -> Result<Transformed<Self>>
    where
        F: FnMut(Self) -> Result<Transformed<Self>>,
    {
        dispatch_rewrap!(self, n => n.map_children(f))
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        dispatch!(self, n => write!(f, "{}", n.node))
    }
}

/// Render expressions as a comma separated list.
pub(crate) fn fmt_exprs(exprs: &[Expression]) -> String {
    exprs
        .iter()
        .map(|expr| expr.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Apply `func` to each expression in `exprs`, tracking if any changed.
pub(crate) fn map_expr_list<F>(
    exprs: Vec<Expression>,
    func: &mut F,
) -> Result<Transformed<Vec<Expression>>>
where
    F: FnMut(Expression) -> Result<Transformed<Expression>>,
{
    let mut changed = false;
    let exprs = exprs
        .into_iter()
        .map(|expr| {
            let transformed = func(expr)?;
            changed |= transformed.changed;
            Ok(transformed.node)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Transformed::new(exprs, changed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{col, eq, lit, unresolved_col};
    use crate::logical::builder::{cross_join, filter, project, subquery_alias, unresolved_table};
    use crate::tree::walk::{inspect, walk, Visitor};
    use crate::types::datatype::DataType;

    /// Project -> Filter -> CrossJoin -> {t1, t2}
    fn test_plan() -> LogicalOperator {
        project(
            vec![unresolved_col("a")],
            filter(
                eq(lit(1_i64), lit(1_i64)),
                cross_join(unresolved_table("t1"), unresolved_table("t2")),
            ),
        )
    }

    /// Records the name of every visited node, `None` for end-of-children
    /// visits.
    struct Recorder {
        visited: Vec<Option<String>>,
        prune_at: Option<&'static str>,
    }

    impl<'a> Visitor<'a, LogicalOperator> for Recorder {
        fn visit(
            &mut self,
            node: Option<&'a LogicalOperator>,
        ) -> Option<&mut dyn Visitor<'a, LogicalOperator>> {
            self.visited.push(node.map(visit_name));
            match node {
                Some(node) if Some(node.name()) == self.prune_at => None,
                _ => Some(self),
            }
        }
    }

    fn visit_name(node: &LogicalOperator) -> String {
        match node {
            LogicalOperator::UnresolvedTable(t) => t.node.name.clone(),
            other => other.name().to_string(),
        }
    }

    fn names(visits: &[&str]) -> Vec<Option<String>> {
        visits
            .iter()
            .map(|v| match *v {
                "-" => None,
                name => Some(name.to_string()),
            })
            .collect()
    }

    #[test]
    fn walk_full() {
        let plan = test_plan();
        let mut recorder = Recorder {
            visited: Vec::new(),
            prune_at: None,
        };
        walk(&mut recorder, &plan);

        let expected = names(&[
            "Project", "Filter", "CrossJoin", "t1", "-", "t2", "-", "-", "-", "-",
        ]);
        assert_eq!(expected, recorder.visited);
    }

    #[test]
    fn walk_pruned_at_join() {
        let plan = test_plan();
        let mut recorder = Recorder {
            visited: Vec::new(),
            prune_at: Some("CrossJoin"),
        };
        walk(&mut recorder, &plan);

        let expected = names(&["Project", "Filter", "CrossJoin", "-", "-"]);
        assert_eq!(expected, recorder.visited);
    }

    #[test]
    fn inspect_matches_walk() {
        let plan = test_plan();

        let mut visited = Vec::new();
        inspect(&plan, |node| {
            visited.push(node.map(visit_name));
            true
        });
        assert_eq!(
            names(&["Project", "Filter", "CrossJoin", "t1", "-", "t2", "-", "-", "-", "-"]),
            visited
        );

        let mut visited = Vec::new();
        inspect(&plan, |node| {
            visited.push(node.map(visit_name));
            !matches!(node, Some(LogicalOperator::CrossJoin(_)))
        });
        assert_eq!(names(&["Project", "Filter", "CrossJoin", "-", "-"]), visited);
    }

    #[test]
    fn visitor_reused_across_siblings() {
        let plan = cross_join(unresolved_table("a"), unresolved_table("b"));
        let mut count = 0;
        inspect(&plan, |node| {
            if node.is_some() {
                count += 1;
            }
            true
        });
        assert_eq!(3, count);
    }

    #[test]
    fn first_unresolved_reports_table() {
        let plan = test_plan();
        assert_eq!(
            Some((EntityKind::Table, "t1".to_string())),
            plan.first_unresolved()
        );
        assert!(!plan.resolved());
    }

    #[test]
    fn node_resolved_ignores_children() {
        let plan = filter(
            eq(col(0, DataType::Int64, "a", false), lit(1_i64)),
            unresolved_table("t1"),
        );
        assert!(plan.node_resolved());
        assert!(!plan.children_resolved());

        let plan = filter(eq(unresolved_col("a"), lit(1_i64)), unresolved_table("t1"));
        assert!(!plan.node_resolved());
    }

    #[test]
    fn with_children_replaces() {
        let plan = filter(
            eq(col(0, DataType::Int64, "a", false), lit(1_i64)),
            unresolved_table("t1"),
        );
        let replaced = plan
            .clone()
            .with_children(vec![unresolved_table("t2")])
            .unwrap();

        assert_eq!(
            "t2",
            visit_name(replaced.children_ref().first().unwrap())
        );
        plan.with_children(Vec::new()).unwrap_err();
    }

    #[test]
    fn subquery_alias_rewrites_source() {
        let plan = subquery_alias(
            "sq",
            crate::logical::builder::values(vec![vec![lit(1_i64), lit("a")]]),
        );
        let schema = plan.schema().unwrap();
        assert_eq!(2, schema.len());
        assert!(schema.iter().all(|c| c.source == "sq"));
    }
}
