use ndarray::{Array2, ArrayView2, Axis};

/// Applies a numerically stable softmax to every row of `x`.
pub fn softmax_rows(x: ArrayView2<f32>) -> Array2<f32> {
    let mut out = x.to_owned();

    for mut row in out.rows_mut() {
        let max = row.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row /= sum;
    }

    out
}

/// Backpropagates through a row-wise softmax.
///
/// # Arguments
/// * `probs` - The softmax output.
/// * `d_probs` - The gradient with respect to the softmax output.
///
/// # Returns
/// The gradient with respect to the softmax input, `p * (dp - sum(dp * p))` per row.
pub fn softmax_rows_backward(probs: ArrayView2<f32>, d_probs: ArrayView2<f32>) -> Array2<f32> {
    let dot = (&d_probs * &probs).sum_axis(Axis(1)).insert_axis(Axis(1));
    &probs * &(&d_probs - &dot)
}
