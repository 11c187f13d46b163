pub mod aggregate_expr;
pub mod arith_expr;
pub mod column_expr;
pub mod comparison_expr;
pub mod conjunction_expr;
pub mod literal_expr;
pub mod scalar_function_expr;

use std::fmt;

use aggregate_expr::AggregateExpr;
use arith_expr::{ArithExpr, ArithOperator};
use column_expr::{ColumnExpr, StarExpr, UnresolvedColumn};
use comparison_expr::{ComparisonExpr, ComparisonOperator};
use conjunction_expr::{not3, ConjunctionExpr, ConjunctionOperator};
use literal_expr::LiteralExpr;
use quarry_error::{internal, EntityKind, Result};
use scalar_function_expr::DatePartExpr;

use crate::context::ExecutionContext;
use crate::functions::aggregate::AggregateFunction;
use crate::functions::scalar::datetime::DatePart;
use crate::tree::walk;
use crate::tree::{Transformed, TreeNode};
use crate::types::datatype::DataType;
use crate::types::scalar::ScalarValue;

#[derive(Debug, Clone, PartialEq)]
pub struct AliasExpr {
    pub alias: String,
    pub expr: Box<Expression>,
}

impl fmt::Display for AliasExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} AS {}", self.expr, self.alias)
    }
}

/// A scalar expression evaluated per row.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(LiteralExpr),
    Column(ColumnExpr),
    UnresolvedColumn(UnresolvedColumn),
    Star(StarExpr),
    Alias(AliasExpr),
    Not(Box<Expression>),
    IsNull(Box<Expression>),
    Conjunction(ConjunctionExpr),
    Comparison(ComparisonExpr),
    Arith(ArithExpr),
    DatePart(DatePartExpr),
    Aggregate(AggregateExpr),
}

impl Expression {
    /// Output type of the expression.
    ///
    /// Errors if the expression hasn't been resolved.
    pub fn datatype(&self) -> Result<DataType> {
        Ok(match self {
            Self::Literal(expr) => expr.datatype,
            Self::Column(expr) => expr.datatype,
            Self::UnresolvedColumn(_) | Self::Star(_) => {
                return Err(internal!("cannot get type of unresolved expression '{self}'"));
            }
            Self::Alias(expr) => expr.expr.datatype()?,
            Self::Not(_) | Self::IsNull(_) | Self::Conjunction(_) | Self::Comparison(_) => {
                DataType::Boolean
            }
            Self::Arith(expr) => expr.datatype()?,
            Self::DatePart(_) => DataType::Int32,
            Self::Aggregate(expr) => expr.datatype()?,
        })
    }

    pub fn nullable(&self) -> bool {
        match self {
            Self::Literal(expr) => expr.literal.is_null(),
            Self::Column(expr) => expr.nullable,
            Self::Alias(expr) => expr.expr.nullable(),
            Self::IsNull(_) => false,
            _ => true,
        }
    }

    /// Name to use for the column this expression produces.
    pub fn name(&self) -> String {
        match self {
            Self::Alias(expr) => expr.alias.clone(),
            Self::Column(expr) => expr.name.clone(),
            Self::UnresolvedColumn(expr) => expr.name.clone(),
            other => other.to_string(),
        }
    }

    /// Table or view the output column originates from, if any.
    pub fn source(&self) -> &str {
        match self {
            Self::Column(expr) => &expr.source,
            Self::Alias(expr) => expr.expr.source(),
            _ => "",
        }
    }

    /// Evaluate the expression against a single row.
    pub fn eval(&self, ctx: &ExecutionContext, row: &[ScalarValue]) -> Result<ScalarValue> {
        match self {
            Self::Literal(expr) => Ok(expr.literal.clone()),
            Self::Column(expr) => expr.eval(row),
            Self::UnresolvedColumn(expr) => Err(quarry_error::DbError::unresolved(
                EntityKind::Column,
                expr.to_string(),
            )),
            Self::Star(expr) => Err(quarry_error::DbError::unresolved(
                EntityKind::Column,
                expr.to_string(),
            )),
            Self::Alias(expr) => expr.expr.eval(ctx, row),
            Self::Not(expr) => Ok(not3(expr.eval(ctx, row)?.try_as_bool()?).into()),
            Self::IsNull(expr) => Ok(ScalarValue::Boolean(expr.eval(ctx, row)?.is_null())),
            Self::Conjunction(expr) => expr.eval(ctx, row),
            Self::Comparison(expr) => expr.eval(ctx, row),
            Self::Arith(expr) => expr.eval(ctx, row),
            Self::DatePart(expr) => expr.eval(ctx, row),
            Self::Aggregate(expr) => Err(internal!(
                "aggregate '{expr}' cannot be evaluated against a single row"
            )),
        }
    }

    /// Check if this expression contains an aggregate anywhere.
    pub fn contains_aggregate(&self) -> bool {
        walk::any(self, |expr| matches!(expr, Expression::Aggregate(_)))
    }

    /// Strip a top-level alias.
    pub fn unalias(&self) -> &Expression {
        match self {
            Self::Alias(expr) => expr.expr.unalias(),
            other => other,
        }
    }
}

impl TreeNode for Expression {
    fn children(&self) -> Vec<&Self> {
        match self {
            Self::Literal(_) | Self::Column(_) | Self::UnresolvedColumn(_) | Self::Star(_) => {
                Vec::new()
            }
            Self::Alias(expr) => vec![expr.expr.as_ref()],
            Self::Not(expr) | Self::IsNull(expr) => vec![expr.as_ref()],
            Self::Conjunction(expr) => vec![expr.left.as_ref(), expr.right.as_ref()],
            Self::Comparison(expr) => vec![expr.left.as_ref(), expr.right.as_ref()],
            Self::Arith(expr) => vec![expr.left.as_ref(), expr.right.as_ref()],
            Self::DatePart(expr) => vec![expr.input.as_ref()],
            Self::Aggregate(expr) => vec![expr.input.as_ref()],
        }
    }

    fn resolved(&self) -> bool {
        match self {
            Self::UnresolvedColumn(_) | Self::Star(_) => false,
            other => other.children().into_iter().all(|child| child.resolved()),
        }
    }

    fn map_children<F>(self, mut f: F) -> Result<Transformed<Self>>
    where
        F: FnMut(Self) -> Result<Transformed<Self>>,
    {
        let mut changed = false;
        let mut apply = |expr: Box<Expression>| -> Result<Box<Expression>> {
            let transformed = f(*expr)?;
            changed |= transformed.changed;
            Ok(Box::new(transformed.node))
        };

        let expr = match self {
            expr @ (Self::Literal(_)
            | Self::Column(_)
            | Self::UnresolvedColumn(_)
            | Self::Star(_)) => expr,
            Self::Alias(AliasExpr { alias, expr }) => Self::Alias(AliasExpr {
                alias,
                expr: apply(expr)?,
            }),
            Self::Not(expr) => Self::Not(apply(expr)?),
            Self::IsNull(expr) => Self::IsNull(apply(expr)?),
            Self::Conjunction(ConjunctionExpr { op, left, right }) => {
                Self::Conjunction(ConjunctionExpr {
                    op,
                    left: apply(left)?,
                    right: apply(right)?,
                })
            }
            Self::Comparison(ComparisonExpr { op, left, right }) => {
                Self::Comparison(ComparisonExpr {
                    op,
                    left: apply(left)?,
                    right: apply(right)?,
                })
            }
            Self::Arith(ArithExpr { op, left, right }) => Self::Arith(ArithExpr {
                op,
                left: apply(left)?,
                right: apply(right)?,
            }),
            Self::DatePart(DatePartExpr { part, input }) => Self::DatePart(DatePartExpr {
                part,
                input: apply(input)?,
            }),
            Self::Aggregate(AggregateExpr {
                function,
                input,
                distinct,
            }) => Self::Aggregate(AggregateExpr {
                function,
                input: apply(input)?,
                distinct,
            }),
        };

        Ok(Transformed::new(expr, changed))
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(expr) => write!(f, "{expr}"),
            Self::Column(expr) => write!(f, "{expr}"),
            Self::UnresolvedColumn(expr) => write!(f, "{expr}"),
            Self::Star(expr) => write!(f, "{expr}"),
            Self::Alias(expr) => write!(f, "{expr}"),
            Self::Not(expr) => write!(f, "NOT({expr})"),
            Self::IsNull(expr) => write!(f, "{expr} IS NULL"),
            Self::Conjunction(expr) => write!(f, "{expr}"),
            Self::Comparison(expr) => write!(f, "{expr}"),
            Self::Arith(expr) => write!(f, "{expr}"),
            Self::DatePart(expr) => write!(f, "{expr}"),
            Self::Aggregate(expr) => write!(f, "{expr}"),
        }
    }
}

pub fn lit(scalar: impl Into<ScalarValue>) -> Expression {
    Expression::Literal(LiteralExpr::new(scalar.into()))
}

/// Literal with an explicit type, used for typed NULLs.
pub fn lit_typed(scalar: ScalarValue, datatype: DataType) -> Expression {
    Expression::Literal(LiteralExpr::typed(scalar, datatype))
}

pub fn col(index: usize, datatype: DataType, name: impl Into<String>, nullable: bool) -> Expression {
    Expression::Column(ColumnExpr::new(index, datatype, name, nullable))
}

pub fn unresolved_col(name: impl Into<String>) -> Expression {
    Expression::UnresolvedColumn(UnresolvedColumn::new(name))
}

pub fn qualified_col(qualifier: impl Into<String>, name: impl Into<String>) -> Expression {
    Expression::UnresolvedColumn(UnresolvedColumn::qualified(qualifier, name))
}

pub fn star() -> Expression {
    Expression::Star(StarExpr { qualifier: None })
}

pub fn qualified_star(qualifier: impl Into<String>) -> Expression {
    Expression::Star(StarExpr {
        qualifier: Some(qualifier.into()),
    })
}

pub fn alias(expr: Expression, alias: impl Into<String>) -> Expression {
    Expression::Alias(AliasExpr {
        alias: alias.into(),
        expr: Box::new(expr),
    })
}

pub fn and(left: Expression, right: Expression) -> Expression {
    Expression::Conjunction(ConjunctionExpr {
        op: ConjunctionOperator::And,
        left: Box::new(left),
        right: Box::new(right),
    })
}

pub fn or(left: Expression, right: Expression) -> Expression {
    Expression::Conjunction(ConjunctionExpr {
        op: ConjunctionOperator::Or,
        left: Box::new(left),
        right: Box::new(right),
    })
}

pub fn not(expr: Expression) -> Expression {
    Expression::Not(Box::new(expr))
}

pub fn is_null(expr: Expression) -> Expression {
    Expression::IsNull(Box::new(expr))
}

pub fn cmp(op: ComparisonOperator, left: Expression, right: Expression) -> Expression {
    Expression::Comparison(ComparisonExpr {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

pub fn eq(left: Expression, right: Expression) -> Expression {
    cmp(ComparisonOperator::Eq, left, right)
}

pub fn arith(op: ArithOperator, left: Expression, right: Expression) -> Expression {
    Expression::Arith(ArithExpr {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

pub fn date_part(part: DatePart, input: Expression) -> Expression {
    Expression::DatePart(DatePartExpr {
        part,
        input: Box::new(input),
    })
}

pub fn aggregate(function: AggregateFunction, input: Expression, distinct: bool) -> Expression {
    Expression::Aggregate(AggregateExpr {
        function,
        input: Box::new(input),
        distinct,
    })
}

pub fn min(input: Expression) -> Expression {
    aggregate(AggregateFunction::Min, input, false)
}

pub fn min_distinct(input: Expression) -> Expression {
    aggregate(AggregateFunction::Min, input, true)
}

pub fn max(input: Expression) -> Expression {
    aggregate(AggregateFunction::Max, input, false)
}
