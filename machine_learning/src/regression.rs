use log::trace;
use serde::{Deserialize, Serialize};

use crate::dataset::Point2D;

/// A one-dimensional linear model `y = weight * x + bias` fitted with full-batch gradient descent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    pub weight: f64,
    pub bias: f64,
}

impl LinearRegression {
    /// Creates a new `LinearRegression` with the given initial parameters.
    pub fn new(weight: f64, bias: f64) -> Self {
        Self { weight, bias }
    }

    /// Evaluates the model at `x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.weight * x + self.bias
    }

    /// Mean squared error of the model over `points`.
    ///
    /// # Returns
    /// The loss, or `0` if `points` is empty.
    pub fn compute_loss(&self, points: &[Point2D]) -> f64 {
        if points.is_empty() {
            return 0.0;
        }

        let sum: f64 = points.iter().map(|p| (self.predict(p.x) - p.y).powi(2)).sum();
        sum / points.len() as f64
    }

    /// Takes one gradient descent step over the whole of `points`.
    ///
    /// # Arguments
    /// * `points` - The training data.
    /// * `learning_rate` - The length of the step.
    ///
    /// # Returns
    /// The loss after the update. Empty input leaves the model untouched and returns `0`.
    pub fn train_step(&mut self, points: &[Point2D], learning_rate: f64) -> f64 {
        if points.is_empty() {
            return 0.0;
        }

        let n = points.len() as f64;
        let (mut dw, mut db) = (0.0, 0.0);

        for p in points {
            let err = self.predict(p.x) - p.y;
            dw += 2.0 * err * p.x;
            db += 2.0 * err;
        }

        self.weight -= learning_rate * dw / n;
        self.bias -= learning_rate * db / n;

        let loss = self.compute_loss(points);
        trace!(weight = self.weight, bias = self.bias, loss = loss; "regression step");
        loss
    }

    /// Runs `epochs` training steps.
    ///
    /// # Returns
    /// The loss after every step.
    pub fn fit(&mut self, points: &[Point2D], learning_rate: f64, epochs: usize) -> Vec<f64> {
        (0..epochs)
            .map(|_| self.train_step(points, learning_rate))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(points: &[f64]) -> Vec<Point2D> {
        points
            .iter()
            .map(|&x| Point2D::new(x, 2.0 * x + 1.0))
            .collect()
    }

    #[test]
    fn empty_input_is_a_no_op() {
        let mut model = LinearRegression::new(0.3, -0.2);

        assert_eq!(model.compute_loss(&[]), 0.0);
        assert_eq!(model.train_step(&[], 0.1), 0.0);
        assert_eq!(model, LinearRegression::new(0.3, -0.2));
    }

    #[test]
    fn converges_to_exact_line() {
        let points = line(&[-2.0, -1.0, -0.5, 0.0, 0.5, 1.0, 2.0]);
        let mut model = LinearRegression::default();

        for _ in 0..1000 {
            model.train_step(&points, 0.01);
        }

        assert!((model.weight - 2.0).abs() < 0.1, "weight was {}", model.weight);
        assert!((model.bias - 1.0).abs() < 0.1, "bias was {}", model.bias);
    }

    #[test]
    fn single_step_reduces_loss() {
        let points = [Point2D::new(1.0, 2.0), Point2D::new(2.0, 4.0)];
        let mut model = LinearRegression::new(0.0, 0.0);

        let before = model.compute_loss(&points);
        assert_eq!(before, 10.0);

        let after = model.train_step(&points, 0.01);
        assert!(after < before, "loss went from {before} to {after}");
    }

    #[test]
    fn fit_reports_one_loss_per_epoch() {
        let points = line(&[0.0, 1.0]);
        let mut model = LinearRegression::default();
        let losses = model.fit(&points, 0.1, 5);

        assert_eq!(losses.len(), 5);
        assert!(losses.windows(2).all(|w| w[1] <= w[0]));
    }
}
