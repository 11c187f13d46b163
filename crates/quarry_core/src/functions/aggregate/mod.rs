pub mod avg;
pub mod distinct;
pub mod minmax;
pub mod sum;

use std::fmt::{self, Debug};

use quarry_error::Result;

use crate::types::datatype::DataType;
use crate::types::scalar::ScalarValue;

/// Accumulator state for a single aggregate instance and grouping key.
pub trait AggregateState: Debug + Send {
    /// Fold a single input value into the state.
    fn update(&mut self, input: ScalarValue) -> Result<()>;

    /// Produce the final value. A state that never saw a non-NULL input
    /// produces NULL.
    fn finalize(&self) -> Result<ScalarValue>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Min,
    Max,
    Sum,
    Avg,
}

impl AggregateFunction {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
        }
    }

    pub fn from_name(name: &str) -> Option<AggregateFunction> {
        [Self::Min, Self::Max, Self::Sum, Self::Avg]
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }

    pub fn return_type(&self, input: &DataType) -> DataType {
        match self {
            Self::Min | Self::Max => *input,
            Self::Sum if input.is_integer() || *input == DataType::Boolean => DataType::Int64,
            Self::Sum | Self::Avg => DataType::Float64,
        }
    }

    pub fn new_state(&self) -> Box<dyn AggregateState> {
        match self {
            Self::Min => Box::new(minmax::MinState::default()),
            Self::Max => Box::new(minmax::MaxState::default()),
            Self::Sum => Box::new(sum::SumState::default()),
            Self::Avg => Box::new(avg::AvgState::default()),
        }
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Opaque buffer owned by the caller for one aggregate instance and grouping
/// key.
#[derive(Debug)]
pub struct AggregationBuffer {
    state: Box<dyn AggregateState>,
}

impl AggregationBuffer {
    pub fn new(state: Box<dyn AggregateState>) -> Self {
        AggregationBuffer { state }
    }

    pub fn update(&mut self, input: ScalarValue) -> Result<()> {
        self.state.update(input)
    }

    pub fn finalize(&self) -> Result<ScalarValue> {
        self.state.finalize()
    }
}
