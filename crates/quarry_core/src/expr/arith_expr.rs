use std::fmt;

use quarry_error::{eval_error, internal, Result};

use super::Expression;
use crate::context::ExecutionContext;
use crate::types::datatype::DataType;
use crate::types::scalar::ScalarValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOperator {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for ArithOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "+"),
            Self::Sub => write!(f, "-"),
            Self::Mul => write!(f, "*"),
            Self::Div => write!(f, "/"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArithExpr {
    pub op: ArithOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

impl ArithExpr {
    pub fn datatype(&self) -> Result<DataType> {
        let left = self.left.datatype()?;
        let right = self.right.datatype()?;

        if self.op == ArithOperator::Div {
            return Ok(DataType::Float64);
        }

        Ok(DataType::arith_result_type(&left, &right).unwrap_or(DataType::Float64))
    }

    /// Evaluate the operator. NULL on either side produces NULL, as does
    /// division by zero.
    pub fn eval(&self, ctx: &ExecutionContext, row: &[ScalarValue]) -> Result<ScalarValue> {
        let left = self.left.eval(ctx, row)?;
        let right = self.right.eval(ctx, row)?;

        if left.is_null() || right.is_null() {
            return Ok(ScalarValue::Null);
        }

        let result_type = match self.op {
            ArithOperator::Div => DataType::Float64,
            _ => DataType::arith_result_type(&left.datatype(), &right.datatype()).ok_or_else(
                || {
                    eval_error!(
                        "cannot apply '{}' to {} and {}",
                        self.op,
                        left.datatype(),
                        right.datatype()
                    )
                },
            )?,
        };

        if result_type.is_integer() {
            let (l, r) = match (left.as_i128(), right.as_i128()) {
                (Some(l), Some(r)) => (l, r),
                _ => return Err(eval_error!("non-integer operands for integer arithmetic")),
            };
            let out = match self.op {
                ArithOperator::Add => l.checked_add(r),
                ArithOperator::Sub => l.checked_sub(r),
                ArithOperator::Mul => l.checked_mul(r),
                ArithOperator::Div => {
                    return Err(internal!("integer division in {self}"));
                }
            }
            .ok_or_else(|| eval_error!("integer overflow evaluating {self}"))?;

            return ScalarValue::Int64(
                i64::try_from(out).map_err(|_| eval_error!("integer overflow evaluating {self}"))?,
            )
            .cast_to(&result_type);
        }

        let (l, r) = match (left.as_f64(), right.as_f64()) {
            (Some(l), Some(r)) => (l, r),
            _ => {
                return Err(eval_error!(
                    "cannot apply '{}' to {} and {}",
                    self.op,
                    left.datatype(),
                    right.datatype()
                ));
            }
        };

        Ok(match self.op {
            ArithOperator::Add => ScalarValue::Float64(l + r),
            ArithOperator::Sub => ScalarValue::Float64(l - r),
            ArithOperator::Mul => ScalarValue::Float64(l * r),
            ArithOperator::Div if r == 0.0 => ScalarValue::Null,
            ArithOperator::Div => ScalarValue::Float64(l / r),
        })
    }
}

impl fmt::Display for ArithExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.left, self.op, self.right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{arith, lit};

    fn eval(expr: Expression) -> Result<ScalarValue> {
        expr.eval(&ExecutionContext::empty(), &[])
    }

    #[test]
    fn add_ints_keeps_type() {
        let got = eval(arith(ArithOperator::Add, lit(4_i32), lit(5_i32))).unwrap();
        assert_eq!(ScalarValue::Int32(9), got);
    }

    #[test]
    fn div_by_zero_is_null() {
        let got = eval(arith(ArithOperator::Div, lit(4_i32), lit(0_i32))).unwrap();
        assert_eq!(ScalarValue::Null, got);
    }

    #[test]
    fn overflow_errors() {
        let err = eval(arith(ArithOperator::Mul, lit(i64::MAX), lit(2_i64))).unwrap_err();
        assert!(matches!(err, quarry_error::DbError::Evaluation(_)));
    }

    #[test]
    fn text_operand_errors() {
        let err = eval(arith(ArithOperator::Add, lit("a"), lit(2_i64))).unwrap_err();
        assert!(matches!(err, quarry_error::DbError::Evaluation(_)));
    }
}
