use log::{debug, trace};
use ndarray::{Array2, ArrayView2, Zip};
use rand::Rng;
use serde::Serialize;

use crate::{
    MlErr, Result,
    arch::{NetworkArchitecture, Sequential, loss::LossFn},
    initialization::{self, ChainWeightGen, ConstWeightGen, RandWeightGen, WeightGen},
    optimization::GradientDescent,
};

/// What a training step reports back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StepMetrics {
    pub loss: f32,
    pub accuracy: f32,
}

/// The parameters of one dense layer, in a shape fit for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DenseWeights {
    /// `kernel[i][j]` connects input `i` to output `j`.
    pub kernel: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
}

/// A feed-forward network together with its parameters.
#[derive(Debug, Clone)]
pub struct Network {
    arch: NetworkArchitecture,
    model: Sequential,
    params: Vec<f32>,
    grad: Vec<f32>,
}

impl Network {
    /// Builds a network with Xavier-uniform kernels and zeroed biases.
    ///
    /// # Arguments
    /// * `arch` - The layers of the network.
    /// * `rng` - The source of randomness for the initial kernels.
    ///
    /// # Returns
    /// An error if the architecture is invalid.
    pub fn new<R: Rng>(arch: NetworkArchitecture, rng: &mut R) -> Result<Self> {
        let model = arch.build()?;

        let mut weight_gens: Vec<Box<dyn WeightGen<R>>> = Vec::new();
        for (fan_in, fan_out, _) in arch.dims() {
            let kernel = RandWeightGen::xavier_uniform(fan_in * fan_out, fan_in, fan_out)?;
            weight_gens.push(Box::new(kernel));
            weight_gens.push(Box::new(ConstWeightGen::new(0.0, fan_out)));
        }

        let mut weight_gen = ChainWeightGen::new(weight_gens);
        let params = initialization::generate(&mut weight_gen, rng, model.size())?;

        debug!(params = params.len(), layers = model.layers().len(); "built network");
        Self::assemble(arch, model, params)
    }

    /// Builds a network around already existing parameters.
    pub fn from_params(arch: NetworkArchitecture, params: Vec<f32>) -> Result<Self> {
        let model = arch.build()?;

        if params.len() != model.size() {
            return Err(MlErr::SizeMismatch {
                what: "network parameters",
                got: params.len(),
                expected: model.size(),
            });
        }

        Self::assemble(arch, model, params)
    }

    fn assemble(arch: NetworkArchitecture, model: Sequential, params: Vec<f32>) -> Result<Self> {
        let grad = vec![0.0; params.len()];

        Ok(Self {
            arch,
            model,
            params,
            grad,
        })
    }

    pub fn architecture(&self) -> &NetworkArchitecture {
        &self.arch
    }

    pub fn params(&self) -> &[f32] {
        &self.params
    }

    /// Runs one full-batch gradient descent step.
    ///
    /// The loss is the one measured by the differentiated pass, before the update. The accuracy
    /// comes from a separate inference pass over the updated parameters.
    ///
    /// # Arguments
    /// * `xs` - The inputs, `[n, input_size]`.
    /// * `ys` - The targets, `[n, output_size]`.
    /// * `learning_rate` - The length of the step.
    ///
    /// # Returns
    /// The step's metrics, all zero for an empty batch.
    pub fn train_step(
        &mut self,
        xs: ArrayView2<f32>,
        ys: ArrayView2<f32>,
        learning_rate: f32,
    ) -> Result<StepMetrics> {
        if xs.nrows() == 0 {
            return Ok(StepMetrics::default());
        }

        self.check_batch(&xs, &ys)?;

        let mut optimizer = GradientDescent::new(learning_rate);
        let loss = self.model.backprop(
            &mut self.params,
            &mut self.grad,
            &self.arch.loss,
            &mut optimizer,
            std::iter::once((xs, ys)),
        )?;

        let preds = self.model.infer(&self.params, xs)?;
        let accuracy = accuracy(preds.view(), ys);

        trace!(loss = loss, accuracy = accuracy; "network step");
        Ok(StepMetrics { loss, accuracy })
    }

    /// Computes the network's output for every row of `xs`.
    pub fn predict(&self, xs: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.model.infer(&self.params, xs)
    }

    /// Samples the first output of the network over a regular grid, for drawing decision
    /// boundaries.
    ///
    /// # Arguments
    /// * `resolution` - The amount of samples along each axis.
    /// * `range_x` - The `(min, max)` range of the first input.
    /// * `range_y` - The `(min, max)` range of the second input.
    ///
    /// # Returns
    /// `resolution²` values in row-major order, `y` being the outer axis.
    pub fn predict_grid(
        &self,
        resolution: usize,
        range_x: (f64, f64),
        range_y: (f64, f64),
    ) -> Result<Vec<f32>> {
        if self.arch.input_size != 2 {
            return Err(MlErr::InvalidInput("grid predictions need a network with 2 inputs"));
        }

        let axis = |(lo, hi): (f64, f64), i: usize| {
            if resolution == 1 {
                (lo + hi) / 2.0
            } else {
                lo + (hi - lo) * i as f64 / (resolution - 1) as f64
            }
        };

        let xs = Array2::from_shape_fn((resolution * resolution, 2), |(row, col)| {
            let (iy, ix) = (row / resolution, row % resolution);
            if col == 0 {
                axis(range_x, ix) as f32
            } else {
                axis(range_y, iy) as f32
            }
        });

        let preds = self.predict(xs.view())?;
        Ok(preds.column(0).to_vec())
    }

    /// Returns the kernel and bias of every layer.
    pub fn weights(&self) -> Result<Vec<DenseWeights>> {
        self.model
            .layer_params(&self.params)
            .zip(self.model.layers())
            .map(|(params, layer)| {
                let (kernel, bias) = layer.view_params(params)?;

                Ok(DenseWeights {
                    kernel: kernel.outer_iter().map(|row| row.to_vec()).collect(),
                    bias: bias.to_vec(),
                })
            })
            .collect()
    }

    fn check_batch(&self, xs: &ArrayView2<f32>, ys: &ArrayView2<f32>) -> Result<()> {
        if xs.ncols() != self.arch.input_size {
            return Err(MlErr::SizeMismatch {
                what: "network input",
                got: xs.ncols(),
                expected: self.arch.input_size,
            });
        }

        if ys.dim() != (xs.nrows(), self.arch.output_size) {
            return Err(MlErr::SizeMismatch {
                what: "network targets",
                got: ys.len(),
                expected: xs.nrows() * self.arch.output_size,
            });
        }

        Ok(())
    }
}

/// Fraction of outputs that round to their target.
fn accuracy(preds: ArrayView2<f32>, ys: ArrayView2<f32>) -> f32 {
    if preds.is_empty() {
        return 0.0;
    }

    let hits = Zip::from(&preds)
        .and(&ys)
        .fold(0usize, |acc, &p, &y| acc + usize::from(p.round() == y));

    hits as f32 / preds.len() as f32
}
