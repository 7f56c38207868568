use ndarray::Array2;

use crate::{MlErr, Result};

/// Sinusoidal positional encoding, `[seq_len, d_model]`.
///
/// Even features use `sin(p / 10000^(i / d))`, odd features use the cosine of the same frequency
/// as their even neighbour.
pub fn positional_encoding(seq_len: usize, d_model: usize) -> Array2<f32> {
    Array2::from_shape_fn((seq_len, d_model), |(pos, i)| {
        let pair = (i - i % 2) as f32;
        let angle = pos as f32 / 10000f32.powf(pair / d_model as f32);

        if i % 2 == 0 { angle.sin() } else { angle.cos() }
    })
}

/// Encodes `tokens` as the rows of a `[tokens.len(), vocab_size]` matrix.
///
/// # Returns
/// An error if any token is not in `[0, vocab_size)`.
pub fn one_hot(tokens: &[usize], vocab_size: usize) -> Result<Array2<f32>> {
    let mut encoded = Array2::zeros((tokens.len(), vocab_size));

    for (row, &token) in tokens.iter().enumerate() {
        if token >= vocab_size {
            return Err(MlErr::TokenOutOfRange { token, vocab_size });
        }

        encoded[[row, token]] = 1.0;
    }

    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_position_alternates_zero_and_one() {
        let pe = positional_encoding(3, 6);

        for i in 0..6 {
            let expected = if i % 2 == 0 { 0.0 } else { 1.0 };
            assert_eq!(pe[[0, i]], expected);
        }

        assert!((pe[[1, 0]] - 1f32.sin()).abs() < 1e-6);
        assert!((pe[[1, 1]] - 1f32.cos()).abs() < 1e-6);
    }

    #[test]
    fn one_hot_rows_pick_the_token() {
        let encoded = one_hot(&[2, 0], 3).unwrap();

        assert_eq!(encoded.row(0).to_vec(), vec![0.0, 0.0, 1.0]);
        assert_eq!(encoded.row(1).to_vec(), vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn out_of_range_tokens_are_rejected() {
        assert_eq!(
            one_hot(&[1, 3], 3),
            Err(MlErr::TokenOutOfRange {
                token: 3,
                vocab_size: 3
            })
        );
    }
}
