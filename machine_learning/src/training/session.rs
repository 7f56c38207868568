use log::debug;
use ndarray::Array2;
use rand::{SeedableRng, rngs::StdRng};

use super::Trainer;
use crate::{
    MlErr, Result,
    arch::NetworkArchitecture,
    network::{Network, StepMetrics},
    optimization::Adam,
    transformer::{self, Prediction, TransformerConfig, TransformerStep, TransformerWeights},
};

/// Trains a feed-forward network on a fixed dataset with full-batch gradient descent.
pub struct NetworkSession {
    network: Option<Network>,
    xs: Array2<f32>,
    ys: Array2<f32>,
    learning_rate: f32,
    rng: StdRng,
}

impl NetworkSession {
    /// Creates a session with no network yet.
    ///
    /// # Arguments
    /// * `xs` - The training inputs, `[n, input_size]`.
    /// * `ys` - The training targets, `[n, output_size]`.
    /// * `learning_rate` - The gradient descent step length.
    /// * `seed` - Seeds the initialization of every network built by this session.
    pub fn new(xs: Array2<f32>, ys: Array2<f32>, learning_rate: f32, seed: u64) -> Self {
        Self {
            network: None,
            xs,
            ys,
            learning_rate,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Replaces the session's network with a freshly initialized one.
    ///
    /// The previous network is dropped before the new one is built.
    pub fn set_architecture(&mut self, arch: NetworkArchitecture) -> Result<()> {
        self.network = None;
        self.network = Some(Network::new(arch, &mut self.rng)?);
        Ok(())
    }

    pub fn set_dataset(&mut self, xs: Array2<f32>, ys: Array2<f32>) {
        self.xs = xs;
        self.ys = ys;
    }

    pub fn set_learning_rate(&mut self, learning_rate: f32) {
        self.learning_rate = learning_rate;
    }

    /// Drops the network, if any.
    pub fn reset(&mut self) {
        self.network = None;
    }

    pub fn network(&self) -> Result<&Network> {
        self.network
            .as_ref()
            .ok_or(MlErr::NotInitialized { what: "network" })
    }

    /// See `Network::predict_grid`.
    pub fn predict_grid(
        &self,
        resolution: usize,
        range_x: (f64, f64),
        range_y: (f64, f64),
    ) -> Result<Vec<f32>> {
        self.network()?.predict_grid(resolution, range_x, range_y)
    }
}

impl Trainer for NetworkSession {
    type Progress = StepMetrics;

    fn step(&mut self) -> Result<StepMetrics> {
        let network = self
            .network
            .as_mut()
            .ok_or(MlErr::NotInitialized { what: "network" })?;

        network.train_step(self.xs.view(), self.ys.view(), self.learning_rate)
    }
}

/// Trains a transformer to sort sequences, drawing a new batch every step.
pub struct TransformerSession {
    model: Option<(TransformerWeights, Adam)>,
    batch_size: usize,
    rng: StdRng,
}

impl TransformerSession {
    /// Creates a session with no transformer yet.
    ///
    /// # Arguments
    /// * `batch_size` - The amount of sequences drawn per step.
    /// * `seed` - Seeds both the weights and the training batches.
    pub fn new(batch_size: usize, seed: u64) -> Self {
        Self {
            model: None,
            batch_size,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Replaces the session's transformer with a freshly initialized one, trained by Adam.
    ///
    /// The previous transformer is dropped before the new one is built.
    pub fn initialize(&mut self, config: TransformerConfig, learning_rate: f32) -> Result<()> {
        self.model = None;

        let weights = TransformerWeights::new(config, &mut self.rng)?;
        let adam = Adam::with_learning_rate(weights.len(), learning_rate);
        debug!(params = weights.len(), learning_rate = learning_rate; "initialized transformer");

        self.model = Some((weights, adam));
        Ok(())
    }

    /// Drops the transformer, if any.
    pub fn reset(&mut self) {
        self.model = None;
    }

    pub fn weights(&self) -> Result<&TransformerWeights> {
        self.model
            .as_ref()
            .map(|(weights, _)| weights)
            .ok_or(MlErr::NotInitialized { what: "transformer" })
    }

    /// Runs the transformer over a single sequence.
    pub fn predict(&self, sequence: &[usize]) -> Result<Prediction> {
        transformer::predict(self.weights()?, sequence)
    }
}

impl Trainer for TransformerSession {
    type Progress = TransformerStep;

    fn step(&mut self) -> Result<TransformerStep> {
        let (weights, adam) = self
            .model
            .as_mut()
            .ok_or(MlErr::NotInitialized { what: "transformer" })?;

        let config = *weights.config();
        let batch = transformer::generate_sort_batch(
            &mut self.rng,
            self.batch_size,
            config.seq_len,
            config.vocab_size,
        )?;

        transformer::train_step(weights, adam, &batch.inputs, &batch.targets)
    }
}
