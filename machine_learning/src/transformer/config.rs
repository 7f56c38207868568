use serde::{Deserialize, Serialize};

use crate::{MlErr, Result};

/// The dimensions of a single-block transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformerConfig {
    pub vocab_size: usize,
    pub seq_len: usize,
    pub d_model: usize,
    pub num_heads: usize,
    pub ffn_dim: usize,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            vocab_size: 8,
            seq_len: 6,
            d_model: 32,
            num_heads: 4,
            ffn_dim: 64,
        }
    }
}

impl TransformerConfig {
    /// Checks that every dimension is positive and that the heads evenly split the model.
    pub fn validate(&self) -> Result<()> {
        let dims = [
            ("vocabSize", self.vocab_size),
            ("seqLen", self.seq_len),
            ("dModel", self.d_model),
            ("numHeads", self.num_heads),
            ("ffnDim", self.ffn_dim),
        ];

        if let Some((name, _)) = dims.iter().find(|(_, value)| *value == 0) {
            return Err(MlErr::InvalidConfig(format!("{name} must be positive")));
        }

        if self.d_model % self.num_heads != 0 {
            return Err(MlErr::InvalidConfig(format!(
                "dModel ({}) must be divisible by numHeads ({})",
                self.d_model, self.num_heads
            )));
        }

        Ok(())
    }

    /// The width of every attention head.
    pub fn head_dim(&self) -> usize {
        self.d_model / self.num_heads
    }
}
