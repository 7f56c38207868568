use ndarray::{Array1, Array2, ArrayView2, Axis};

const EPSILON: f32 = 1e-5;

/// What the backward pass of a layer norm needs from its forward pass.
#[derive(Debug, Clone)]
pub struct NormCache {
    x_hat: Array2<f32>,
    inv_std: Array1<f32>,
}

/// Normalizes every row of `x` to zero mean and unit variance, then scales and shifts it.
///
/// # Arguments
/// * `x` - The input, `[rows, d]`.
/// * `gain` - The learned scale, `[1, d]`.
/// * `bias` - The learned shift, `[1, d]`.
pub fn layer_norm(
    x: ArrayView2<f32>,
    gain: ArrayView2<f32>,
    bias: ArrayView2<f32>,
) -> (Array2<f32>, NormCache) {
    let d = x.ncols() as f32;

    let mean = (x.sum_axis(Axis(1)) / d).insert_axis(Axis(1));
    let centered = &x - &mean;
    let var = centered.mapv(|v| v * v).sum_axis(Axis(1)) / d;
    let inv_std = var.mapv(|v| 1.0 / (v + EPSILON).sqrt());

    let x_hat = &centered * &inv_std.view().insert_axis(Axis(1));
    let out = &x_hat * &gain + &bias;

    (out, NormCache { x_hat, inv_std })
}

/// Backpropagates `dy` through a layer norm.
///
/// # Returns
/// The gradients with respect to the input, the gain and the bias.
pub fn layer_norm_backward(
    cache: &NormCache,
    gain: ArrayView2<f32>,
    dy: ArrayView2<f32>,
) -> (Array2<f32>, Array2<f32>, Array2<f32>) {
    let d = dy.ncols() as f32;
    let x_hat = &cache.x_hat;

    let d_gain = (&dy * x_hat).sum_axis(Axis(0)).insert_axis(Axis(0));
    let d_bias = dy.sum_axis(Axis(0)).insert_axis(Axis(0));

    let dx_hat = &dy * &gain;
    let sum = dx_hat.sum_axis(Axis(1)).insert_axis(Axis(1));
    let dot = (&dx_hat * x_hat).sum_axis(Axis(1)).insert_axis(Axis(1));
    let inv_std = cache.inv_std.view().insert_axis(Axis(1));

    let dx = (dx_hat * d - &sum - x_hat * &dot) * &inv_std / d;

    (dx, d_gain, d_bias)
}
