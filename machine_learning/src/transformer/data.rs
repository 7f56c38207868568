use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{MlErr, Result};

/// Random sequences and their sorted counterparts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortBatch {
    pub inputs: Vec<Vec<usize>>,
    pub targets: Vec<Vec<usize>>,
}

/// Generates `batch_size` sequences of `seq_len` tokens drawn uniformly from `[0, vocab_size)`.
///
/// # Returns
/// An error if tokens are needed but the vocabulary is empty.
pub fn generate_sort_batch<R: Rng + ?Sized>(
    rng: &mut R,
    batch_size: usize,
    seq_len: usize,
    vocab_size: usize,
) -> Result<SortBatch> {
    if vocab_size == 0 && seq_len > 0 {
        return Err(MlErr::InvalidInput("cannot draw tokens from an empty vocabulary"));
    }

    let mut inputs = Vec::with_capacity(batch_size);
    let mut targets = Vec::with_capacity(batch_size);

    for _ in 0..batch_size {
        let input: Vec<usize> = (0..seq_len).map(|_| rng.random_range(0..vocab_size)).collect();
        let mut target = input.clone();
        target.sort_unstable();

        inputs.push(input);
        targets.push(target);
    }

    Ok(SortBatch { inputs, targets })
}
