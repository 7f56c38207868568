//! Generators for the initial values of flat parameter buffers.

mod chain;
mod constant;
mod random;
mod weight_gen;

use rand::Rng;

pub use chain::ChainWeightGen;
pub use constant::ConstWeightGen;
pub use random::RandWeightGen;
pub use weight_gen::WeightGen;

use crate::{MlErr, Result};

/// Draws exactly `n` weights out of `weight_gen`.
///
/// # Returns
/// An error if the generator runs out before `n` weights were produced.
pub fn generate<R, W>(weight_gen: &mut W, rng: &mut R, n: usize) -> Result<Vec<f32>>
where
    R: Rng,
    W: WeightGen<R> + ?Sized,
{
    let weights = weight_gen.sample(rng, n).unwrap_or_default();

    if weights.len() != n {
        return Err(MlErr::SizeMismatch {
            what: "generated weights",
            got: weights.len(),
            expected: n,
        });
    }

    Ok(weights)
}
