use std::fmt;

use quarry_error::Result;

use super::Expression;
use crate::context::ExecutionContext;
use crate::functions::aggregate::distinct::DistinctState;
use crate::functions::aggregate::{AggregateFunction, AggregationBuffer};
use crate::types::datatype::DataType;
use crate::types::scalar::ScalarValue;

/// An aggregate over a single input expression.
///
/// Callers own the buffers. The expected protocol is one `new_buffer` per
/// grouping key, `update` once per input row in arrival order, then a single
/// `eval`.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateExpr {
    pub function: AggregateFunction,
    pub input: Box<Expression>,
    pub distinct: bool,
}

impl AggregateExpr {
    pub fn datatype(&self) -> Result<DataType> {
        Ok(self.function.return_type(&self.input.datatype()?))
    }

    pub fn new_buffer(&self) -> AggregationBuffer {
        let state = self.function.new_state();
        if self.distinct {
            AggregationBuffer::new(Box::new(DistinctState::new(state)))
        } else {
            AggregationBuffer::new(state)
        }
    }

    pub fn update(
        &self,
        ctx: &ExecutionContext,
        buffer: &mut AggregationBuffer,
        row: &[ScalarValue],
    ) -> Result<()> {
        let value = self.input.eval(ctx, row)?;
        buffer.update(value)
    }

    pub fn eval(&self, _ctx: &ExecutionContext, buffer: &AggregationBuffer) -> Result<ScalarValue> {
        buffer.finalize()
    }
}

impl fmt::Display for AggregateExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.distinct {
            write!(f, "{}(DISTINCT {})", self.function, self.input)
        } else {
            write!(f, "{}({})", self.function, self.input)
        }
    }
}
