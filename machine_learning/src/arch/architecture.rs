use serde::{Deserialize, Serialize};

use super::{activations::Activation, layers::Dense, loss::LossKind, sequential::Sequential};
use crate::{MlErr, Result};

/// A hidden layer of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSpec {
    pub units: usize,
    #[serde(default)]
    pub activation: Activation,
}

/// The description of a feed-forward network, from its input to its output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkArchitecture {
    pub input_size: usize,
    #[serde(default)]
    pub layers: Vec<LayerSpec>,
    pub output_size: usize,
    #[serde(default = "default_output_activation")]
    pub output_activation: Activation,
    #[serde(default)]
    pub loss: LossKind,
}

fn default_output_activation() -> Activation {
    Activation::Sigmoid
}

impl Default for NetworkArchitecture {
    fn default() -> Self {
        Self {
            input_size: 2,
            layers: vec![
                LayerSpec {
                    units: 8,
                    activation: Activation::Relu,
                },
                LayerSpec {
                    units: 8,
                    activation: Activation::Relu,
                },
            ],
            output_size: 1,
            output_activation: default_output_activation(),
            loss: LossKind::default(),
        }
    }
}

impl NetworkArchitecture {
    /// Checks that every layer has at least one unit.
    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 {
            return Err(MlErr::InvalidConfig("input size must be positive".into()));
        }

        if self.output_size == 0 {
            return Err(MlErr::InvalidConfig("output size must be positive".into()));
        }

        if let Some(i) = self.layers.iter().position(|layer| layer.units == 0) {
            return Err(MlErr::InvalidConfig(format!(
                "hidden layer {i} must have at least one unit"
            )));
        }

        Ok(())
    }

    /// Returns the `(inputs, outputs, activation)` triple of every dense layer, output included.
    pub fn dims(&self) -> Vec<(usize, usize, Activation)> {
        let mut fan_in = self.input_size;
        let mut dims = Vec::with_capacity(self.layers.len() + 1);

        for layer in &self.layers {
            dims.push((fan_in, layer.units, layer.activation));
            fan_in = layer.units;
        }

        dims.push((fan_in, self.output_size, self.output_activation));
        dims
    }

    /// Builds the (parameterless) model this architecture describes.
    pub fn build(&self) -> Result<Sequential> {
        self.validate()?;

        let layers = self
            .dims()
            .into_iter()
            .map(|(fan_in, fan_out, activation)| Dense::new((fan_in, fan_out), activation.act_fn()));

        Ok(Sequential::new(layers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_with_defaults() {
        let json = r#"{
            "inputSize": 2,
            "layers": [{ "units": 4, "activation": "tanh" }],
            "outputSize": 1
        }"#;

        let arch: NetworkArchitecture = serde_json::from_str(json).unwrap();

        assert_eq!(arch.layers[0].activation, Activation::Tanh);
        assert_eq!(arch.output_activation, Activation::Sigmoid);
        assert_eq!(arch.loss, LossKind::BinaryCrossEntropy);
        assert_eq!(
            arch.dims(),
            vec![(2, 4, Activation::Tanh), (4, 1, Activation::Sigmoid)]
        );
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let mut arch = NetworkArchitecture::default();
        arch.layers[1].units = 0;
        assert!(arch.validate().is_err());

        let arch = NetworkArchitecture {
            input_size: 0,
            ..Default::default()
        };
        assert!(arch.build().is_err());
    }

    #[test]
    fn no_hidden_layers_is_a_single_dense() {
        let arch = NetworkArchitecture {
            layers: Vec::new(),
            ..Default::default()
        };

        let model = arch.build().unwrap();
        assert_eq!(model.layers().len(), 1);
        assert_eq!(model.size(), 3);
    }
}
