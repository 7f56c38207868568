use ndarray::{Array2, ArrayView2};

/// A function measuring how far a prediction is from its target.
pub trait LossFn {
    /// Computes the loss of `y_pred` against `y`, averaged over the batch.
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32;

    /// Computes the gradient of `loss` with respect to `y_pred`.
    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Array2<f32>;
}
