use hashbrown::HashSet;
use quarry_error::Result;

use super::AggregateState;
use crate::types::scalar::ScalarValue;

/// Wraps an aggregate so that each distinct input value is folded at most
/// once.
///
/// NULL is tracked in the seen set like any other value but is still handed
/// to the inner state, which skips it.
#[derive(Debug)]
pub struct DistinctState {
    seen: HashSet<ScalarValue, ahash::RandomState>,
    inner: Box<dyn AggregateState>,
}

impl DistinctState {
    pub fn new(inner: Box<dyn AggregateState>) -> Self {
        DistinctState {
            seen: HashSet::with_hasher(ahash::RandomState::new()),
            inner,
        }
    }
}

impl AggregateState for DistinctState {
    fn update(&mut self, input: ScalarValue) -> Result<()> {
        if self.seen.contains(&input) {
            return Ok(());
        }
        self.seen.insert(input.clone());
        self.inner.update(input)
    }

    fn finalize(&self) -> Result<ScalarValue> {
        self.inner.finalize()
    }
}
