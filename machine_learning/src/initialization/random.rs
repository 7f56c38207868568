use rand::Rng;
use rand_distr::{Distribution, Normal, NormalError, Uniform, uniform::Error as UniformError};

use super::WeightGen;

/// A weight generator that samples from a probability distribution.
#[derive(Debug, Clone)]
pub struct RandWeightGen<D: Distribution<f32>> {
    distribution: D,
    remaining: usize,
}

impl<D: Distribution<f32>> RandWeightGen<D> {
    /// Creates a new `RandWeightGen`.
    ///
    /// # Arguments
    /// * `distribution` - The distribution to sample from.
    /// * `limit` - The maximum amount of numbers to generate.
    pub fn new(distribution: D, limit: usize) -> Self {
        Self {
            distribution,
            remaining: limit,
        }
    }
}

impl RandWeightGen<Uniform<f32>> {
    /// Uniform weights in `[low, high)`.
    ///
    /// # Returns
    /// An error if the range is invalid (low >= high).
    pub fn uniform(limit: usize, low: f32, high: f32) -> Result<Self, UniformError> {
        Ok(Self::new(Uniform::new(low, high)?, limit))
    }

    /// Xavier (Glorot) uniform initialization, `U(-r, r)` with `r = sqrt(6 / (fan_in + fan_out))`.
    ///
    /// # Arguments
    /// * `limit` - The maximum amount of numbers to generate.
    /// * `fan_in` - The number of input units in the weight tensor.
    /// * `fan_out` - The number of output units in the weight tensor.
    pub fn xavier_uniform(
        limit: usize,
        fan_in: usize,
        fan_out: usize,
    ) -> Result<Self, UniformError> {
        let range = (6. / (fan_in + fan_out) as f32).sqrt();
        Self::uniform(limit, -range, range)
    }
}

impl RandWeightGen<Normal<f32>> {
    /// Normally distributed weights.
    ///
    /// # Returns
    /// An error if `std_dev` is not finite or negative.
    pub fn normal(limit: usize, mean: f32, std_dev: f32) -> Result<Self, NormalError> {
        Ok(Self::new(Normal::new(mean, std_dev)?, limit))
    }
}

impl<R: Rng, D: Distribution<f32>> WeightGen<R> for RandWeightGen<D> {
    fn sample(&mut self, rng: &mut R, n: usize) -> Option<Vec<f32>> {
        if self.remaining == 0 {
            return None;
        }

        let n = n.min(self.remaining);
        self.remaining -= n;
        Some((0..n).map(|_| self.distribution.sample(rng)).collect())
    }

    fn remaining(&self) -> usize {
        self.remaining
    }
}
