mod bce;
mod loss_fn;
mod mse;
mod softmax_ce;

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

pub use bce::BinaryCrossEntropy;
pub use loss_fn::LossFn;
pub use mse::Mse;
pub use softmax_ce::SoftmaxCrossEntropy;

/// The loss a network is trained against, as written in an architecture description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LossKind {
    #[default]
    BinaryCrossEntropy,
    MeanSquaredError,
}

impl LossFn for LossKind {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32 {
        match self {
            LossKind::BinaryCrossEntropy => BinaryCrossEntropy.loss(y_pred, y),
            LossKind::MeanSquaredError => Mse.loss(y_pred, y),
        }
    }

    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Array2<f32> {
        match self {
            LossKind::BinaryCrossEntropy => BinaryCrossEntropy.loss_prime(y_pred, y),
            LossKind::MeanSquaredError => Mse.loss_prime(y_pred, y),
        }
    }
}
