use serde::{Deserialize, Serialize};

use super::ActFn;

/// The activation of a layer as it is written in an architecture description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Activation {
    Linear,
    #[default]
    Relu,
    Sigmoid,
    Tanh,
}

impl Activation {
    /// Returns the function to apply, `None` for `Linear`.
    pub fn act_fn(self) -> Option<ActFn> {
        match self {
            Activation::Linear => None,
            Activation::Relu => Some(ActFn::Relu),
            Activation::Sigmoid => Some(ActFn::Sigmoid),
            Activation::Tanh => Some(ActFn::Tanh),
        }
    }
}
