use std::cmp::Ordering;

use quarry_error::Result;

use super::AggregateState;
use crate::types::scalar::ScalarValue;

#[derive(Debug, Default)]
pub struct MinState {
    min: Option<ScalarValue>,
}

impl AggregateState for MinState {
    fn update(&mut self, input: ScalarValue) -> Result<()> {
        if input.is_null() {
            return Ok(());
        }
        match &self.min {
            Some(min) if input.try_cmp(min)? != Some(Ordering::Less) => (),
            _ => self.min = Some(input),
        }
        Ok(())
    }

    fn finalize(&self) -> Result<ScalarValue> {
        Ok(self.min.clone().unwrap_or(ScalarValue::Null))
    }
}

#[derive(Debug, Default)]
pub struct MaxState {
    max: Option<ScalarValue>,
}

impl AggregateState for MaxState {
    fn update(&mut self, input: ScalarValue) -> Result<()> {
        if input.is_null() {
            return Ok(());
        }
        match &self.max {
            Some(max) if input.try_cmp(max)? != Some(Ordering::Greater) => (),
            _ => self.max = Some(input),
        }
        Ok(())
    }

    fn finalize(&self) -> Result<ScalarValue> {
        Ok(self.max.clone().unwrap_or(ScalarValue::Null))
    }
}
