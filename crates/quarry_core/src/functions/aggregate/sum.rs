use quarry_error::{eval_error, Result};

use super::AggregateState;
use crate::types::scalar::ScalarValue;

/// Running sum. Stays integral until a float input is seen.
#[derive(Debug, Default)]
pub struct SumState {
    sum: Option<Sum>,
}

#[derive(Debug, Clone, Copy)]
enum Sum {
    Int(i128),
    Float(f64),
}

impl SumState {
    pub(crate) fn add(&mut self, input: &ScalarValue) -> Result<bool> {
        let next = match input {
            ScalarValue::Null => return Ok(false),
            ScalarValue::Boolean(b) => Sum::Int(*b as i128),
            ScalarValue::Float32(_) | ScalarValue::Float64(_) => {
                Sum::Float(input.as_f64().unwrap_or_default())
            }
            other => match other.as_i128() {
                Some(v) => Sum::Int(v),
                None => return Err(eval_error!("SUM: invalid input of type {}", other.datatype())),
            },
        };

        self.sum = Some(match (self.sum, next) {
            (None, next) => next,
            (Some(Sum::Int(a)), Sum::Int(b)) => Sum::Int(
                a.checked_add(b)
                    .ok_or_else(|| eval_error!("SUM: integer overflow"))?,
            ),
            (Some(Sum::Int(a)), Sum::Float(b)) => Sum::Float(a as f64 + b),
            (Some(Sum::Float(a)), Sum::Int(b)) => Sum::Float(a + b as f64),
            (Some(Sum::Float(a)), Sum::Float(b)) => Sum::Float(a + b),
        });

        Ok(true)
    }

    pub(crate) fn as_f64(&self) -> Option<f64> {
        self.sum.map(|sum| match sum {
            Sum::Int(v) => v as f64,
            Sum::Float(v) => v,
        })
    }
}

impl AggregateState for SumState {
    fn update(&mut self, input: ScalarValue) -> Result<()> {
        self.add(&input)?;
        Ok(())
    }

    fn finalize(&self) -> Result<ScalarValue> {
        Ok(match self.sum {
            None => ScalarValue::Null,
            Some(Sum::Int(v)) => ScalarValue::Int64(
                i64::try_from(v).map_err(|_| eval_error!("SUM: integer overflow"))?,
            ),
            Some(Sum::Float(v)) => ScalarValue::Float64(v),
        })
    }
}
