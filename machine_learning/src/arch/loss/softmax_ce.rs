use ndarray::{Array2, ArrayView2, Zip};

use super::LossFn;
use crate::arch::activations::softmax_rows;

/// Cross-entropy between the row-wise softmax of some logits and one-hot targets.
///
/// Takes raw logits, not probabilities, so the softmax and the logarithm can be fused.
#[derive(Debug, Default, Clone, Copy)]
pub struct SoftmaxCrossEntropy;

impl SoftmaxCrossEntropy {
    /// Returns a new `SoftmaxCrossEntropy`.
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for SoftmaxCrossEntropy {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32 {
        let rows = y_pred.nrows();
        if rows == 0 {
            return 0.0;
        }

        let mut total = 0.0;
        for (logits, target) in y_pred.rows().into_iter().zip(y.rows()) {
            let max = logits.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
            let log_sum = logits.mapv(|v| (v - max).exp()).sum().ln() + max;

            total -= Zip::from(&logits)
                .and(&target)
                .fold(0.0, |acc, &l, &t| acc + t * (l - log_sum));
        }

        total / rows as f32
    }

    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Array2<f32> {
        let rows = y_pred.nrows().max(1) as f32;
        (softmax_rows(y_pred) - &y) / rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn uniform_logits_cost_log_of_classes() {
        let ce = SoftmaxCrossEntropy::new();
        let logits = Array2::zeros((2, 4));
        let y = array![[1.0f32, 0.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.0]];

        assert!((ce.loss(logits.view(), y.view()) - 4.0f32.ln()).abs() < 1e-6);
    }

    #[test]
    fn gradient_rows_sum_to_zero() {
        let ce = SoftmaxCrossEntropy::new();
        let logits = array![[2.0f32, -1.0, 0.5]];
        let y = array![[0.0f32, 1.0, 0.0]];
        let d = ce.loss_prime(logits.view(), y.view());

        assert!(d.sum().abs() < 1e-6);
        assert!(d[[0, 1]] < 0.0);
    }
}
