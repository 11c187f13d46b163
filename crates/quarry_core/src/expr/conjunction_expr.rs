use std::fmt;

use quarry_error::Result;

use super::Expression;
use crate::context::ExecutionContext;
use crate::types::scalar::ScalarValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConjunctionOperator {
    And,
    Or,
}

impl fmt::Display for ConjunctionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

/// Binary AND/OR using SQL three-valued logic.
#[derive(Debug, Clone, PartialEq)]
pub struct ConjunctionExpr {
    pub op: ConjunctionOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

impl ConjunctionExpr {
    pub fn eval(&self, ctx: &ExecutionContext, row: &[ScalarValue]) -> Result<ScalarValue> {
        let left = self.left.eval(ctx, row)?.try_as_bool()?;

        // Dominating values short-circuit.
        match (self.op, left) {
            (ConjunctionOperator::And, Some(false)) => return Ok(ScalarValue::Boolean(false)),
            (ConjunctionOperator::Or, Some(true)) => return Ok(ScalarValue::Boolean(true)),
            _ => (),
        }

        let right = self.right.eval(ctx, row)?.try_as_bool()?;
        let out = match self.op {
            ConjunctionOperator::And => and3(left, right),
            ConjunctionOperator::Or => or3(left, right),
        };

        Ok(out.into())
    }
}

impl fmt::Display for ConjunctionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.left, self.op, self.right)
    }
}

/// Three-valued AND. `None` is NULL.
pub fn and3(left: Option<bool>, right: Option<bool>) -> Option<bool> {
    match (left, right) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

/// Three-valued OR. `None` is NULL.
pub fn or3(left: Option<bool>, right: Option<bool>) -> Option<bool> {
    match (left, right) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

/// Three-valued NOT.
pub fn not3(input: Option<bool>) -> Option<bool> {
    input.map(|b| !b)
}

/// Combine predicates into a left-deep chain of ANDs, preserving order.
///
/// Returns `None` when there's nothing to combine.
pub fn join_and(predicates: impl IntoIterator<Item = Expression>) -> Option<Expression> {
    predicates.into_iter().reduce(super::and)
}
