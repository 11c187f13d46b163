use std::fmt;

use quarry_error::Result;

use super::Expression;
use crate::context::ExecutionContext;
use crate::functions::scalar::datetime::DatePart;
use crate::types::scalar::ScalarValue;

/// Date part extraction, e.g. `YEAR(created_at)`.
#[derive(Debug, Clone, PartialEq)]
pub struct DatePartExpr {
    pub part: DatePart,
    pub input: Box<Expression>,
}

impl DatePartExpr {
    pub fn eval(&self, ctx: &ExecutionContext, row: &[ScalarValue]) -> Result<ScalarValue> {
        let input = self.input.eval(ctx, row)?;
        self.part.extract(&input)
    }
}

impl fmt::Display for DatePartExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.part, self.input)
    }
}
