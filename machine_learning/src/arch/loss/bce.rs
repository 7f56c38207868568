use ndarray::{Array2, ArrayView2, Zip};

use super::LossFn;

/// Probabilities are kept this far away from 0 and 1 so the logarithms stay finite.
const EPSILON: f32 = 1e-7;

/// Binary cross-entropy over probabilities, usually the output of a sigmoid.
#[derive(Debug, Default, Clone, Copy)]
pub struct BinaryCrossEntropy;

impl BinaryCrossEntropy {
    /// Returns a new `BinaryCrossEntropy`.
    pub fn new() -> Self {
        Self
    }
}

fn clip(p: f32) -> f32 {
    p.clamp(EPSILON, 1.0 - EPSILON)
}

impl LossFn for BinaryCrossEntropy {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32 {
        if y_pred.is_empty() {
            return 0.0;
        }

        let total = Zip::from(&y_pred).and(&y).fold(0.0, |acc, &p, &t| {
            let p = clip(p);
            acc - (t * p.ln() + (1.0 - t) * (1.0 - p).ln())
        });

        total / y_pred.len() as f32
    }

    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Array2<f32> {
        let n = y_pred.len().max(1) as f32;

        Zip::from(&y_pred)
            .and(&y)
            .map_collect(|&p, &t| {
                let p = clip(p);
                (p - t) / (p * (1.0 - p)) / n
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn confident_right_answers_cost_little() {
        let bce = BinaryCrossEntropy::new();
        let y = array![[1.0f32], [0.0]];

        let good = bce.loss(array![[0.99f32], [0.01]].view(), y.view());
        let bad = bce.loss(array![[0.01f32], [0.99]].view(), y.view());

        assert!(good < 0.02, "good loss was {good}");
        assert!(bad > 4.0, "bad loss was {bad}");
    }

    #[test]
    fn saturated_predictions_stay_finite() {
        let bce = BinaryCrossEntropy::new();
        let y_pred = array![[0.0f32], [1.0]];
        let y = array![[1.0f32], [0.0]];

        assert!(bce.loss(y_pred.view(), y.view()).is_finite());
        assert!(bce.loss_prime(y_pred.view(), y.view()).iter().all(|g| g.is_finite()));
    }

    #[test]
    fn gradient_points_away_from_target() {
        let bce = BinaryCrossEntropy::new();
        let d = bce.loss_prime(array![[0.3f32, 0.8]].view(), array![[1.0f32, 0.0]].view());

        assert!(d[[0, 0]] < 0.0);
        assert!(d[[0, 1]] > 0.0);
    }
}
