use quarry_error::Result;

use super::sum::SumState;
use super::AggregateState;
use crate::types::scalar::ScalarValue;

#[derive(Debug, Default)]
pub struct AvgState {
    sum: SumState,
    count: u64,
}

impl AggregateState for AvgState {
    fn update(&mut self, input: ScalarValue) -> Result<()> {
        if self.sum.add(&input)? {
            self.count += 1;
        }
        Ok(())
    }

    fn finalize(&self) -> Result<ScalarValue> {
        Ok(match self.sum.as_f64() {
            Some(sum) if self.count > 0 => ScalarValue::Float64(sum / self.count as f64),
            _ => ScalarValue::Null,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avg_ignores_nulls() {
        let mut state = AvgState::default();
        for v in [
            ScalarValue::Int32(1),
            ScalarValue::Null,
            ScalarValue::Int32(2),
        ] {
            state.update(v).unwrap();
        }
        assert_eq!(ScalarValue::Float64(1.5), state.finalize().unwrap());
    }

    #[test]
    fn avg_empty_is_null() {
        let mut state = AvgState::default();
        state.update(ScalarValue::Null).unwrap();
        assert_eq!(ScalarValue::Null, state.finalize().unwrap());
    }
}
