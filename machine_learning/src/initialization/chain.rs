use rand::Rng;

use super::WeightGen;

/// A weight generator that delegates to a chain of generators, moving on to the next one as each
/// is exhausted.
///
/// This allows a different initialization for each tensor of a model while still producing the
/// whole flat parameter buffer in one go.
pub struct ChainWeightGen<R: Rng> {
    weight_gens: Vec<Box<dyn WeightGen<R>>>,
    curr: usize,
}

impl<R: Rng> ChainWeightGen<R> {
    /// Creates a new `ChainWeightGen`.
    ///
    /// # Arguments
    /// * `weight_gens` - The generators, in the order their weights should appear.
    pub fn new(weight_gens: Vec<Box<dyn WeightGen<R>>>) -> Self {
        Self {
            weight_gens,
            curr: 0,
        }
    }
}

impl<R: Rng> WeightGen<R> for ChainWeightGen<R> {
    fn sample(&mut self, rng: &mut R, n: usize) -> Option<Vec<f32>> {
        if self.curr == self.weight_gens.len() {
            return None;
        }

        match self.weight_gens[self.curr].sample(rng, n) {
            Some(sample) if sample.len() == n => Some(sample),
            Some(mut sample) => {
                self.curr += 1;

                if let Some(next_sample) = self.sample(rng, n - sample.len()) {
                    sample.extend(next_sample);
                }

                Some(sample)
            }
            None => {
                self.curr += 1;
                self.sample(rng, n)
            }
        }
    }

    fn remaining(&self) -> usize {
        self.weight_gens[self.curr..]
            .iter()
            .map(|weight_gen| weight_gen.remaining())
            .sum()
    }
}
