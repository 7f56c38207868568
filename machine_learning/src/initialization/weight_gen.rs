use rand::Rng;

/// A source of initial parameter values.
pub trait WeightGen<R: Rng> {
    /// Samples at most `n` weights.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `n` - The upper limit of samples to generate.
    ///
    /// # Returns
    /// `None` once the generator is exhausted.
    fn sample(&mut self, rng: &mut R, n: usize) -> Option<Vec<f32>>;

    /// Returns the amount of weights this generator can still produce.
    fn remaining(&self) -> usize;
}
