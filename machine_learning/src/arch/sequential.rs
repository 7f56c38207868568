use ndarray::{Array2, ArrayView2};

use super::{
    layers::Dense,
    loss::LossFn,
    params::{BackIter, FrontIter},
};
use crate::{MlErr, Result, optimization::Optimizer};

/// A sequential model: information flows forward when computing an output and backward when
/// computing the *deltas* of its layers.
#[derive(Debug, Clone)]
pub struct Sequential {
    layers: Vec<Dense>,
    layer_sizes: Vec<usize>,
}

impl Sequential {
    /// Creates a new `Sequential`.
    ///
    /// # Arguments
    /// * `layers` - The layers the sequential is composed of.
    ///
    /// # Returns
    /// A new `Sequential` instance.
    pub fn new<I>(layers: I) -> Self
    where
        I: IntoIterator<Item = Dense>,
    {
        let layers: Vec<Dense> = layers.into_iter().collect();
        let layer_sizes = layers.iter().map(Dense::size).collect();

        Self {
            layers,
            layer_sizes,
        }
    }

    /// Returns the amount of parameters in the model.
    pub fn size(&self) -> usize {
        self.layer_sizes.iter().sum()
    }

    pub fn layers(&self) -> &[Dense] {
        &self.layers
    }

    /// Splits `params` into one slice per layer.
    pub fn layer_params<'a>(&'a self, params: &'a [f32]) -> FrontIter<'a> {
        FrontIter::new(params, &self.layer_sizes)
    }

    /// Makes a forward pass through the network, caching what `backprop` needs.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `x` - The input data.
    ///
    /// # Returns
    /// The prediction for the given input or an error if occurred.
    pub fn forward<'a>(
        &'a mut self,
        params: &[f32],
        mut x: ArrayView2<'a, f32>,
    ) -> Result<ArrayView2<'a, f32>> {
        self.check_size(params.len())?;

        let front = FrontIter::new(params, &self.layer_sizes);
        for (layer, params) in self.layers.iter_mut().zip(front) {
            x = layer.forward(params, x)?;
        }

        Ok(x)
    }

    /// Makes a forward pass without touching any layer's cache.
    pub fn infer(&self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_size(params.len())?;

        let mut front = self.layer_params(params).zip(&self.layers);
        let Some((params, first)) = front.next() else {
            return Ok(x.to_owned());
        };

        let mut out = first.infer(params, x)?;
        for (params, layer) in front {
            out = layer.infer(params, out.view())?;
        }

        Ok(out)
    }

    /// Computes the gradient of the loss function with respect to the parameters of the model over
    /// the provided batches. **`params` gets updated** for each batch according to the
    /// optimization algorithm.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `grad` - A buffer for writing the computed gradient on each batch pass.
    /// * `loss_fn` - The loss function.
    /// * `optimizer` - The optimizer that dictates how to update the weights on each gradient calculation.
    /// * `batches` - The batches of data.
    ///
    /// # Returns
    /// The average loss over the batches, measured before each update.
    pub fn backprop<'a, L, O, I>(
        &mut self,
        params: &mut [f32],
        grad: &mut [f32],
        loss_fn: &L,
        optimizer: &mut O,
        batches: I,
    ) -> Result<f32>
    where
        L: LossFn,
        O: Optimizer,
        I: Iterator<Item = (ArrayView2<'a, f32>, ArrayView2<'a, f32>)>,
    {
        self.check_size(params.len())?;
        self.check_size(grad.len())?;

        let mut total_loss = 0.0;
        let mut num_batches = 0;

        for (x, y) in batches {
            grad.fill(0.0);

            let y_pred = self.forward(params, x)?;
            if y_pred.dim() != y.dim() {
                return Err(MlErr::SizeMismatch {
                    what: "targets",
                    got: y.len(),
                    expected: y_pred.len(),
                });
            }

            total_loss += loss_fn.loss(y_pred, y);
            num_batches += 1;

            let mut d_last = loss_fn.loss_prime(y_pred, y);
            let mut d = d_last.view_mut();
            let back = BackIter::new(params, grad, &self.layer_sizes);

            for (layer, (params, grad)) in self.layers.iter_mut().rev().zip(back) {
                d = layer.backward(params, grad, d)?;
            }

            optimizer.update_params(params, grad)?;
        }

        if num_batches == 0 {
            return Ok(0.0);
        }

        Ok(total_loss / num_batches as f32)
    }

    fn check_size(&self, got: usize) -> Result<()> {
        let expected = self.size();
        if got != expected {
            return Err(MlErr::SizeMismatch {
                what: "model parameters",
                got,
                expected,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        arch::{activations::ActFn, loss::Mse},
        optimization::GradientDescent,
    };
    use ndarray::array;

    fn model() -> Sequential {
        Sequential::new([
            Dense::new((2, 3), Some(ActFn::Tanh)),
            Dense::new((3, 1), None),
        ])
    }

    #[test]
    fn size_is_the_sum_of_layer_sizes() {
        assert_eq!(model().size(), 9 + 4);
    }

    #[test]
    fn forward_and_infer_agree() {
        let mut model = model();
        let params: Vec<f32> = (0..model.size()).map(|i| (i as f32 * 0.37).sin()).collect();
        let x = array![[0.5, -1.0], [2.0, 0.1]];

        let inferred = model.infer(&params, x.view()).unwrap();
        let forwarded = model.forward(&params, x.view()).unwrap().to_owned();

        assert_eq!(inferred.dim(), (2, 1));
        assert!(inferred.iter().zip(&forwarded).all(|(a, b)| (a - b).abs() < 1e-6));
    }

    #[test]
    fn backprop_reduces_loss() {
        let mut model = model();
        let mut params: Vec<f32> = (0..model.size()).map(|i| (i as f32 * 0.7).cos() * 0.5).collect();
        let mut grad = vec![0.0; model.size()];
        let mut optimizer = GradientDescent::new(0.1);

        let x = array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
        let y = array![[0.0], [1.0], [1.0], [2.0]];

        let first = model
            .backprop(&mut params, &mut grad, &Mse, &mut optimizer, std::iter::once((x.view(), y.view())))
            .unwrap();

        let mut last = first;
        for _ in 0..50 {
            last = model
                .backprop(&mut params, &mut grad, &Mse, &mut optimizer, std::iter::once((x.view(), y.view())))
                .unwrap();
        }

        assert!(last < first, "loss went from {first} to {last}");
    }

    #[test]
    fn wrong_buffer_size_is_an_error() {
        let mut model = model();
        let x = array![[0.5, -1.0]];

        assert!(model.forward(&[0.0; 3], x.view()).is_err());
    }
}
