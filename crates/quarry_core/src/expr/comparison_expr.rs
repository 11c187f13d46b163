use std::cmp::Ordering;
use std::fmt;

use quarry_error::Result;

use super::Expression;
use crate::context::ExecutionContext;
use crate::types::scalar::ScalarValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl ComparisonOperator {
    fn matches(&self, ord: Ordering) -> bool {
        match self {
            Self::Eq => ord == Ordering::Equal,
            Self::NotEq => ord != Ordering::Equal,
            Self::Lt => ord == Ordering::Less,
            Self::LtEq => ord != Ordering::Greater,
            Self::Gt => ord == Ordering::Greater,
            Self::GtEq => ord != Ordering::Less,
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::NotEq => write!(f, "!="),
            Self::Lt => write!(f, "<"),
            Self::LtEq => write!(f, "<="),
            Self::Gt => write!(f, ">"),
            Self::GtEq => write!(f, ">="),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonExpr {
    pub op: ComparisonOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

impl ComparisonExpr {
    /// Compare both sides, producing NULL if either side is NULL.
    pub fn eval(&self, ctx: &ExecutionContext, row: &[ScalarValue]) -> Result<ScalarValue> {
        let left = self.left.eval(ctx, row)?;
        let right = self.right.eval(ctx, row)?;

        Ok(match left.try_cmp(&right)? {
            Some(ord) => ScalarValue::Boolean(self.op.matches(ord)),
            None => ScalarValue::Null,
        })
    }
}

impl fmt::Display for ComparisonExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op, self.right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{cmp, lit};

    #[test]
    fn compare_mixed_widths() {
        let expr = cmp(ComparisonOperator::Lt, lit(3_i32), lit(4_i64));
        let got = expr.eval(&ExecutionContext::empty(), &[]).unwrap();
        assert_eq!(ScalarValue::Boolean(true), got);
    }

    #[test]
    fn compare_null_propagates() {
        let expr = cmp(ComparisonOperator::Eq, lit(ScalarValue::Null), lit(4_i64));
        let got = expr.eval(&ExecutionContext::empty(), &[]).unwrap();
        assert_eq!(ScalarValue::Null, got);
    }
}
