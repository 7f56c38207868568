use super::Optimizer;
use crate::{MlErr, Result};

/// Adam, gradient descent with bias-corrected first and second moment estimates.
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    beta1_t: f32,
    beta2_t: f32,
    v: Box<[f32]>,
    s: Box<[f32]>,
    epsilon: f32,
}

impl Adam {
    /// Creates a new `Adam` optimizer.
    ///
    /// # Arguments
    /// * `len` - The amount of parameters this instance should hold moments for.
    /// * `learning_rate` - The base step length.
    /// * `beta1` - Decay rate of the first moment.
    /// * `beta2` - Decay rate of the second moment.
    /// * `epsilon` - Keeps the update finite when the second moment is zero.
    pub fn new(len: usize, learning_rate: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self {
            learning_rate,
            beta1,
            beta2,
            beta1_t: 1.,
            beta2_t: 1.,
            v: vec![0.; len].into_boxed_slice(),
            s: vec![0.; len].into_boxed_slice(),
            epsilon,
        }
    }

    /// Creates a new `Adam` optimizer with the usual `0.9`, `0.999` and `1e-8` hyperparameters.
    pub fn with_learning_rate(len: usize, learning_rate: f32) -> Self {
        Self::new(len, learning_rate, 0.9, 0.999, 1e-8)
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    pub fn len(&self) -> usize {
        self.v.len()
    }

    pub fn is_empty(&self) -> bool {
        self.v.is_empty()
    }
}

impl Optimizer for Adam {
    fn update_params(&mut self, params: &mut [f32], grad: &[f32]) -> Result<()> {
        if params.len() != self.v.len() || grad.len() != self.v.len() {
            return Err(MlErr::SizeMismatch {
                what: "adam state",
                got: params.len().max(grad.len()),
                expected: self.v.len(),
            });
        }

        let Self {
            learning_rate: lr,
            beta1: b1,
            beta2: b2,
            epsilon: eps,
            ..
        } = *self;

        self.beta1_t *= b1;
        self.beta2_t *= b2;

        let bc1 = 1. - self.beta1_t;
        let bc2 = 1. - self.beta2_t;
        let step_size = lr * (bc2.sqrt() / bc1);

        params
            .iter_mut()
            .zip(grad)
            .zip(self.v.iter_mut())
            .zip(self.s.iter_mut())
            .for_each(|(((w, g), v), s)| {
                *v = b1 * *v + (1. - b1) * g;
                *s = b2 * *s + (1. - b2) * g.powi(2);
                *w -= step_size * *v / (s.sqrt() + eps);
            });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_step_moves_by_the_learning_rate() {
        // bias correction makes the very first step exactly lr * sign(g)
        let mut adam = Adam::with_learning_rate(2, 0.1);
        let mut params = [1.0, -1.0];

        adam.update_params(&mut params, &[5.0, -0.01]).unwrap();

        assert!((params[0] - 0.9).abs() < 1e-5);
        assert!((params[1] + 0.9).abs() < 1e-4);
    }

    #[test]
    fn minimizes_a_quadratic() {
        let mut adam = Adam::with_learning_rate(1, 0.05);
        let mut params = [3.0f32];

        for _ in 0..500 {
            let grad = [2.0 * params[0]];
            adam.update_params(&mut params, &grad).unwrap();
        }

        assert!(params[0].abs() < 0.1, "ended at {}", params[0]);
    }

    #[test]
    fn rejects_foreign_buffers() {
        let mut adam = Adam::with_learning_rate(3, 0.1);
        assert!(adam.update_params(&mut [0.0; 2], &[0.0; 2]).is_err());
    }
}
