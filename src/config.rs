use std::{env, fs, path::Path};

use anyhow::Context;
use machine_learning::{
    arch::NetworkArchitecture, dataset::DatasetKind, descent::Surface,
    transformer::TransformerConfig,
};
use serde::Deserialize;

/// Environment variable holding the config path when none is given on the command line.
pub const CONFIG_ENV: &str = "PLAYGROUND_CONFIG";

/// The parameters of every demo, all of them optional in the config file.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaygroundConfig {
    /// Seeds every random choice, a random seed is drawn when absent.
    pub seed: Option<u64>,
    pub regression: RegressionConfig,
    pub kmeans: KMeansConfig,
    pub descent: DescentConfig,
    pub network: NetworkConfig,
    pub transformer: TransformerDemoConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegressionConfig {
    pub points: usize,
    pub slope: f64,
    pub intercept: f64,
    pub noise: f64,
    pub learning_rate: f64,
    pub epochs: usize,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            points: 100,
            slope: 2.0,
            intercept: 0.5,
            noise: 0.1,
            learning_rate: 0.1,
            epochs: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KMeansConfig {
    pub points: usize,
    pub clusters: usize,
    pub spread: f64,
    pub k: usize,
    pub max_iterations: usize,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            points: 300,
            clusters: 3,
            spread: 0.5,
            k: 3,
            max_iterations: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DescentConfig {
    pub surface: Surface,
    pub start: (f64, f64),
    pub learning_rate: f64,
    pub steps: usize,
}

impl Default for DescentConfig {
    fn default() -> Self {
        Self {
            surface: Surface::Bowl,
            start: (1.5, -1.5),
            learning_rate: 0.1,
            steps: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkConfig {
    pub dataset: DatasetKind,
    pub points: usize,
    pub noise: f64,
    pub architecture: NetworkArchitecture,
    pub learning_rate: f32,
    /// `None` trains until interrupted.
    pub steps: Option<usize>,
    pub grid_resolution: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            dataset: DatasetKind::Circle,
            points: 200,
            noise: 0.1,
            architecture: NetworkArchitecture::default(),
            learning_rate: 0.1,
            steps: Some(500),
            grid_resolution: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformerDemoConfig {
    pub model: TransformerConfig,
    pub learning_rate: f32,
    pub batch_size: usize,
    /// `None` trains until interrupted.
    pub steps: Option<usize>,
}

impl Default for TransformerDemoConfig {
    fn default() -> Self {
        Self {
            model: TransformerConfig::default(),
            learning_rate: 0.01,
            batch_size: 32,
            steps: Some(300),
        }
    }
}

impl PlaygroundConfig {
    /// Reads a config from a JSON file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;

        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config at {}", path.display()))
    }

    /// Loads the config from `path`, falling back to `PLAYGROUND_CONFIG` and then to the
    /// defaults.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => path.to_string(),
            None => match env::var(CONFIG_ENV) {
                Ok(path) => path,
                Err(_) => return Ok(Self::default()),
            },
        };

        Self::from_file(Path::new(&path))
    }
}
