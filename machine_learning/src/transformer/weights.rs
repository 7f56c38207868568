use log::debug;
use ndarray::{ArrayView2, ArrayViewMut2};
use rand::Rng;

use super::TransformerConfig;
use crate::{
    MlErr, Result,
    initialization::{self, ChainWeightGen, ConstWeightGen, RandWeightGen, WeightGen},
};

/// Every trainable tensor of the transformer, in buffer order.
///
/// Vectors (biases, layer norm gains) are stored as single-row matrices so they broadcast over
/// the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    Embedding,
    Query,
    Key,
    Value,
    AttnOutput,
    Norm1Gain,
    Norm1Bias,
    Ffn1,
    FfnBias1,
    Ffn2,
    FfnBias2,
    Norm2Gain,
    Norm2Bias,
    Projection,
}
use Param::*;

impl Param {
    pub const ALL: [Param; 14] = [
        Embedding, Query, Key, Value, AttnOutput, Norm1Gain, Norm1Bias, Ffn1, FfnBias1, Ffn2,
        FfnBias2, Norm2Gain, Norm2Bias, Projection,
    ];

    /// The `(rows, cols)` shape of this tensor under `config`.
    pub fn shape(self, config: &TransformerConfig) -> (usize, usize) {
        let TransformerConfig {
            vocab_size: v,
            d_model: d,
            ffn_dim: f,
            ..
        } = *config;

        match self {
            Embedding => (v, d),
            Query | Key | Value | AttnOutput => (d, d),
            Norm1Gain | Norm1Bias | Norm2Gain | Norm2Bias | FfnBias2 => (1, d),
            Ffn1 => (d, f),
            FfnBias1 => (1, f),
            Ffn2 => (f, d),
            Projection => (d, v),
        }
    }

    fn weight_gen<R: Rng>(self, config: &TransformerConfig) -> Result<Box<dyn WeightGen<R>>> {
        let (rows, cols) = self.shape(config);
        let n = rows * cols;

        let weight_gen: Box<dyn WeightGen<R>> = match self {
            Embedding => Box::new(RandWeightGen::normal(n, 0.0, 0.1)?),
            Query | Key | Value | AttnOutput | Ffn1 | Ffn2 | Projection => {
                Box::new(RandWeightGen::xavier_uniform(n, rows, cols)?)
            }
            Norm1Gain | Norm2Gain => Box::new(ConstWeightGen::new(1.0, n)),
            Norm1Bias | Norm2Bias | FfnBias1 | FfnBias2 => Box::new(ConstWeightGen::new(0.0, n)),
        };

        Ok(weight_gen)
    }
}

/// Where each tensor lives inside a flat buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamLayout {
    entries: Vec<(usize, (usize, usize))>,
    len: usize,
}

impl ParamLayout {
    /// Lays out every `Param` back to back.
    pub fn new(config: &TransformerConfig) -> Self {
        let mut offset = 0;
        let entries = Param::ALL
            .iter()
            .map(|param| {
                let shape = param.shape(config);
                let entry = (offset, shape);
                offset += shape.0 * shape.1;
                entry
            })
            .collect();

        Self {
            entries,
            len: offset,
        }
    }

    /// The total amount of parameters.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The range of `param` inside the buffer.
    pub fn range(&self, param: Param) -> std::ops::Range<usize> {
        let (offset, (rows, cols)) = self.entries[param as usize];
        offset..offset + rows * cols
    }

    /// Views the part of `buf` that holds `param`.
    pub fn view<'a>(&self, buf: &'a [f32], param: Param) -> Result<ArrayView2<'a, f32>> {
        self.check(buf.len())?;
        let (_, shape) = self.entries[param as usize];
        Ok(ArrayView2::from_shape(shape, &buf[self.range(param)])?)
    }

    /// Mutably views the part of `buf` that holds `param`.
    pub fn view_mut<'a>(&self, buf: &'a mut [f32], param: Param) -> Result<ArrayViewMut2<'a, f32>> {
        self.check(buf.len())?;
        let (_, shape) = self.entries[param as usize];
        Ok(ArrayViewMut2::from_shape(shape, &mut buf[self.range(param)])?)
    }

    fn check(&self, got: usize) -> Result<()> {
        if got != self.len {
            return Err(MlErr::SizeMismatch {
                what: "transformer parameters",
                got,
                expected: self.len,
            });
        }

        Ok(())
    }
}

/// All the trainable parameters of a transformer, in one flat buffer.
#[derive(Debug, Clone)]
pub struct TransformerWeights {
    config: TransformerConfig,
    layout: ParamLayout,
    params: Vec<f32>,
}

impl TransformerWeights {
    /// Creates freshly initialized weights.
    ///
    /// Embeddings are drawn from `N(0, 0.1)`, matrices use Xavier-uniform, layer norm gains start
    /// at one and every bias at zero.
    ///
    /// # Returns
    /// An error if `config` is invalid.
    pub fn new<R: Rng>(config: TransformerConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;

        let layout = ParamLayout::new(&config);
        let weight_gens = Param::ALL
            .iter()
            .map(|param| param.weight_gen(&config))
            .collect::<Result<Vec<_>>>()?;

        let mut weight_gen = ChainWeightGen::new(weight_gens);
        let params = initialization::generate(&mut weight_gen, rng, layout.len())?;

        debug!(params = params.len(), d_model = config.d_model; "built transformer weights");

        Ok(Self {
            config,
            layout,
            params,
        })
    }

    pub fn config(&self) -> &TransformerConfig {
        &self.config
    }

    pub fn layout(&self) -> &ParamLayout {
        &self.layout
    }

    pub fn params(&self) -> &[f32] {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut [f32] {
        &mut self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Views a single tensor.
    pub fn view(&self, param: Param) -> Result<ArrayView2<'_, f32>> {
        self.layout.view(&self.params, param)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn config() -> TransformerConfig {
        TransformerConfig {
            vocab_size: 5,
            seq_len: 4,
            d_model: 8,
            num_heads: 2,
            ffn_dim: 12,
        }
    }

    #[test]
    fn layout_covers_every_tensor() {
        let (v, d, f) = (5, 8, 12);
        let expected = v * d + 4 * d * d + 2 * d + d * f + f + f * d + d + 2 * d + d * v;

        let layout = ParamLayout::new(&config());
        assert_eq!(layout.len(), expected);
        assert_eq!(layout.range(Embedding).start, 0);
        assert_eq!(layout.range(Projection).end, expected);
    }

    #[test]
    fn initial_values_follow_their_tensor() {
        let mut rng = StdRng::seed_from_u64(0);
        let weights = TransformerWeights::new(config(), &mut rng).unwrap();

        assert!(weights.view(Norm1Gain).unwrap().iter().all(|g| *g == 1.0));
        assert!(weights.view(FfnBias1).unwrap().iter().all(|b| *b == 0.0));
        assert_eq!(weights.view(Ffn1).unwrap().dim(), (8, 12));
        assert!(weights.view(Query).unwrap().iter().any(|w| *w != 0.0));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let config = TransformerConfig {
            num_heads: 3,
            ..config()
        };

        assert!(TransformerWeights::new(config, &mut rng).is_err());
    }
}
