use rand::Rng;

use super::WeightGen;

/// A weight generator that always yields the same value, typically used for biases and
/// layer norm gains.
#[derive(Debug, Clone)]
pub struct ConstWeightGen {
    value: f32,
    remaining: usize,
}

impl ConstWeightGen {
    /// Creates a new `ConstWeightGen`.
    ///
    /// # Arguments
    /// * `value` - The value to always generate.
    /// * `limit` - The maximum amount of times to generate that value.
    pub fn new(value: f32, limit: usize) -> Self {
        Self {
            value,
            remaining: limit,
        }
    }
}

impl<R: Rng> WeightGen<R> for ConstWeightGen {
    fn sample(&mut self, _rng: &mut R, n: usize) -> Option<Vec<f32>> {
        if self.remaining == 0 {
            return None;
        }

        let n = n.min(self.remaining);
        self.remaining -= n;
        Some(vec![self.value; n])
    }

    fn remaining(&self) -> usize {
        self.remaining
    }
}
