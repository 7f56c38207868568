use std::str::FromStr;

use anyhow::{Context, bail};
use log::info;
use machine_learning::{
    clustering::{KMeans, KMeansStep},
    dataset::{self, Point2D, generate_gaussian_clusters, generate_linear_data},
    descent::DescentPath,
    network::{DenseWeights, StepMetrics},
    regression::LinearRegression,
    training::{NetworkSession, StopFlag, Trainer, TrainingLoop, TransformerSession},
};
use ndarray::Array3;
use rand::{SeedableRng, rngs::StdRng};
use serde::Serialize;
use serde_json::Value;

use crate::config::{
    DescentConfig, KMeansConfig, NetworkConfig, PlaygroundConfig, RegressionConfig,
    TransformerDemoConfig,
};

/// The algorithms the playground can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demo {
    Regression,
    KMeans,
    Descent,
    Network,
    Transformer,
}

impl FromStr for Demo {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "regression" => Ok(Demo::Regression),
            "kmeans" => Ok(Demo::KMeans),
            "descent" => Ok(Demo::Descent),
            "network" => Ok(Demo::Network),
            "transformer" => Ok(Demo::Transformer),
            other => bail!("unknown demo {other:?}"),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegressionReport {
    model: LinearRegression,
    initial_loss: f64,
    final_loss: f64,
    epochs: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct KMeansReport {
    iterations: usize,
    converged: bool,
    inertia: f64,
    centroids: Vec<Point2D>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DescentReport {
    surface: &'static str,
    path: Vec<(f64, f64)>,
    final_value: f64,
    minimum: Option<(f64, f64)>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NetworkReport {
    steps: usize,
    last: StepMetrics,
    grid_resolution: usize,
    grid: Vec<f32>,
    weights: Vec<DenseWeights>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransformerReport {
    steps: usize,
    loss: Option<f32>,
    accuracy: Option<f32>,
    sample: Vec<usize>,
    prediction: Vec<usize>,
    /// `[head][query][key]`.
    attention: Vec<Vec<Vec<f32>>>,
}

/// Runs a demo to completion, or until `stop` is set for the iterative ones.
///
/// # Returns
/// The demo's report as JSON.
pub fn run(demo: Demo, config: &PlaygroundConfig, stop: StopFlag) -> anyhow::Result<Value> {
    let seed = config.seed.unwrap_or_else(rand::random);
    info!(seed = seed; "running {demo:?}");

    let report = match demo {
        Demo::Regression => serde_json::to_value(regression(&config.regression, seed)),
        Demo::KMeans => serde_json::to_value(kmeans(&config.kmeans, seed)?),
        Demo::Descent => serde_json::to_value(descent(&config.descent)),
        Demo::Network => serde_json::to_value(network(&config.network, seed, stop)?),
        Demo::Transformer => serde_json::to_value(transformer(&config.transformer, seed, stop)?),
    };

    report.context("failed to serialize the report")
}

fn regression(config: &RegressionConfig, seed: u64) -> RegressionReport {
    let mut rng = StdRng::seed_from_u64(seed);
    let points = generate_linear_data(
        &mut rng,
        config.points,
        config.slope,
        config.intercept,
        config.noise,
    );

    let mut model = LinearRegression::default();
    let initial_loss = model.compute_loss(&points);
    let losses = model.fit(&points, config.learning_rate, config.epochs);

    RegressionReport {
        model,
        initial_loss,
        final_loss: losses.last().copied().unwrap_or(initial_loss),
        epochs: losses.len(),
    }
}

fn kmeans(config: &KMeansConfig, seed: u64) -> anyhow::Result<KMeansReport> {
    let mut rng = StdRng::seed_from_u64(seed);
    let points = generate_gaussian_clusters(&mut rng, config.points, config.clusters, config.spread);

    let mut kmeans = KMeans::new(config.k)?;
    let mut last: Option<KMeansStep> = None;
    let mut iterations = 0;

    while iterations < config.max_iterations && !last.as_ref().is_some_and(|s| s.converged) {
        last = Some(kmeans.step(&points, &mut rng));
        iterations += 1;
    }

    Ok(KMeansReport {
        iterations,
        converged: last.is_some_and(|s| s.converged),
        inertia: kmeans.inertia(&points),
        centroids: kmeans.centroids().to_vec(),
    })
}

fn descent(config: &DescentConfig) -> DescentReport {
    let surface = config.surface;
    let mut path = vec![config.start];
    path.extend(DescentPath::new(surface, config.start, config.learning_rate).take(config.steps));

    let (x, y) = path.last().copied().unwrap_or(config.start);

    DescentReport {
        surface: surface.name(),
        final_value: surface.evaluate(x, y),
        minimum: surface.minimum(),
        path,
    }
}

fn network(config: &NetworkConfig, seed: u64, stop: StopFlag) -> anyhow::Result<NetworkReport> {
    let mut rng = StdRng::seed_from_u64(seed);
    let points = config.dataset.generate(&mut rng, config.points, config.noise);
    let (xs, ys) = dataset::to_arrays(&points);

    let mut session = NetworkSession::new(xs, ys, config.learning_rate, seed);
    session
        .set_architecture(config.architecture.clone())
        .context("invalid network architecture")?;

    let (steps, last) = train(&mut session, stop, config.steps)?;
    let network = session.network()?;

    Ok(NetworkReport {
        steps,
        last: last.unwrap_or_default(),
        grid_resolution: config.grid_resolution,
        grid: network.predict_grid(config.grid_resolution, (-1.5, 1.5), (-1.5, 1.5))?,
        weights: network.weights()?,
    })
}

fn transformer(
    config: &TransformerDemoConfig,
    seed: u64,
    stop: StopFlag,
) -> anyhow::Result<TransformerReport> {
    let mut session = TransformerSession::new(config.batch_size, seed);
    session
        .initialize(config.model, config.learning_rate)
        .context("invalid transformer config")?;

    let (steps, last) = train(&mut session, stop, config.steps)?;

    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));
    let model = config.model;
    let batch = machine_learning::transformer::generate_sort_batch(
        &mut rng,
        1,
        model.seq_len,
        model.vocab_size,
    )?;
    let sample = batch.inputs.into_iter().next().unwrap_or_default();
    let prediction = session.predict(&sample)?;

    Ok(TransformerReport {
        steps,
        loss: last.as_ref().map(|s| s.loss),
        accuracy: last.as_ref().map(|s| s.accuracy),
        sample,
        prediction: prediction.prediction,
        attention: nested(&prediction.attention),
    })
}

/// Drives `trainer` until `limit` or `stop`, logging its progress now and then.
///
/// # Returns
/// The amount of steps run and the last step's progress.
fn train<T: Trainer>(
    trainer: T,
    stop: StopFlag,
    limit: Option<usize>,
) -> anyhow::Result<(usize, Option<T::Progress>)>
where
    T::Progress: std::fmt::Debug,
{
    let mut training = TrainingLoop::new(trainer, stop, limit);
    let mut last = None;

    while let Some(progress) = training.next() {
        let progress = progress.with_context(|| format!("step {} failed", training.steps()))?;

        if training.steps() % 50 == 0 {
            info!(step = training.steps(); "{progress:?}");
        }

        last = Some(progress);
    }

    Ok((training.steps(), last))
}

fn nested(attention: &Array3<f32>) -> Vec<Vec<Vec<f32>>> {
    attention
        .outer_iter()
        .map(|head| head.rows().into_iter().map(|row| row.to_vec()).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_names_parse() {
        assert_eq!("kmeans".parse::<Demo>().unwrap(), Demo::KMeans);
        assert_eq!("Transformer".parse::<Demo>().unwrap(), Demo::Transformer);
        assert!("svm".parse::<Demo>().is_err());
    }

    #[test]
    fn regression_recovers_the_line() {
        let config = RegressionConfig {
            noise: 0.0,
            learning_rate: 0.5,
            epochs: 500,
            ..RegressionConfig::default()
        };

        let report = regression(&config, 1);

        assert!((report.model.weight - config.slope).abs() < 0.05);
        assert!((report.model.bias - config.intercept).abs() < 0.05);
        assert!(report.final_loss < report.initial_loss);
    }

    #[test]
    fn descent_path_starts_at_the_start() {
        let report = descent(&DescentConfig::default());

        assert_eq!(report.path.len(), 101);
        assert_eq!(report.path[0], (1.5, -1.5));
        assert!(report.final_value < 1e-6);
    }

    #[test]
    fn stopped_network_demo_still_reports() {
        let stop = StopFlag::new();
        stop.stop();

        let report = network(&NetworkConfig::default(), 3, stop).unwrap();

        assert_eq!(report.steps, 0);
        assert_eq!(report.grid.len(), 400);
        assert_eq!(report.weights.len(), 3);
    }

    #[test]
    fn reports_serialize_to_json() {
        let config = PlaygroundConfig {
            seed: Some(5),
            ..PlaygroundConfig::default()
        };

        let value = run(Demo::KMeans, &config, StopFlag::new()).unwrap();

        assert_eq!(value["centroids"].as_array().unwrap().len(), 3);
        assert!(value["inertia"].as_f64().unwrap() > 0.0);
    }
}
