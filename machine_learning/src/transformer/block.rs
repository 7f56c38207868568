use ndarray::{Array2, Array3, ArrayView2, Axis, s};

use super::{
    TransformerWeights,
    encoding::{one_hot, positional_encoding},
    norm::{NormCache, layer_norm, layer_norm_backward},
    weights::{Param, ParamLayout},
};
use crate::{
    MlErr, Result,
    arch::activations::{softmax_rows, softmax_rows_backward},
};

/// Everything a forward pass over one sequence produced, kept for its backward pass.
#[derive(Debug, Clone)]
pub struct SequenceCache {
    one_hot: Array2<f32>,
    h0: Array2<f32>,
    q: Array2<f32>,
    k: Array2<f32>,
    v: Array2<f32>,
    attention: Array3<f32>,
    concat: Array2<f32>,
    norm1: NormCache,
    n1: Array2<f32>,
    f1: Array2<f32>,
    a1: Array2<f32>,
    norm2: NormCache,
    n2: Array2<f32>,
    logits: Array2<f32>,
}

impl SequenceCache {
    /// The per-position logits, `[seq_len, vocab_size]`.
    pub fn logits(&self) -> ArrayView2<'_, f32> {
        self.logits.view()
    }

    /// The attention weights of every head, `[num_heads, seq_len, seq_len]`.
    pub fn attention(&self) -> &Array3<f32> {
        &self.attention
    }

    pub fn into_attention(self) -> Array3<f32> {
        self.attention
    }

    /// Backpropagates `d_logits` through the whole block.
    ///
    /// # Arguments
    /// * `weights` - The weights the forward pass ran with.
    /// * `d_logits` - The gradient of the loss with respect to the logits.
    ///
    /// # Returns
    /// The gradient with respect to every parameter, laid out like `weights`.
    pub fn backward(
        &self,
        weights: &TransformerWeights,
        d_logits: ArrayView2<f32>,
    ) -> Result<Vec<f32>> {
        let layout = weights.layout();
        let config = weights.config();
        let mut grad = vec![0.0; layout.len()];

        if d_logits.dim() != self.logits.dim() {
            return Err(MlErr::SizeMismatch {
                what: "logits gradient",
                got: d_logits.len(),
                expected: self.logits.len(),
            });
        }

        // output head
        write(layout, &mut grad, Param::Projection, &self.n2.t().dot(&d_logits))?;
        let dn2 = d_logits.dot(&weights.view(Param::Projection)?.t());

        let (dr2, d_gain, d_bias) =
            layer_norm_backward(&self.norm2, weights.view(Param::Norm2Gain)?, dn2.view());
        write(layout, &mut grad, Param::Norm2Gain, &d_gain)?;
        write(layout, &mut grad, Param::Norm2Bias, &d_bias)?;

        // feed-forward, the residual carries dr2 straight to n1
        write(layout, &mut grad, Param::Ffn2, &self.a1.t().dot(&dr2))?;
        write(layout, &mut grad, Param::FfnBias2, &column_sums(&dr2))?;

        let mut df1 = dr2.dot(&weights.view(Param::Ffn2)?.t());
        df1.zip_mut_with(&self.f1, |d, &z| {
            if z <= 0.0 {
                *d = 0.0;
            }
        });
        write(layout, &mut grad, Param::Ffn1, &self.n1.t().dot(&df1))?;
        write(layout, &mut grad, Param::FfnBias1, &column_sums(&df1))?;

        let dn1 = dr2 + df1.dot(&weights.view(Param::Ffn1)?.t());

        let (dr1, d_gain, d_bias) =
            layer_norm_backward(&self.norm1, weights.view(Param::Norm1Gain)?, dn1.view());
        write(layout, &mut grad, Param::Norm1Gain, &d_gain)?;
        write(layout, &mut grad, Param::Norm1Bias, &d_bias)?;

        // attention
        write(layout, &mut grad, Param::AttnOutput, &self.concat.t().dot(&dr1))?;
        let d_concat = dr1.dot(&weights.view(Param::AttnOutput)?.t());

        let head_dim = config.head_dim();
        let scale = 1.0 / (head_dim as f32).sqrt();
        let mut dq = Array2::<f32>::zeros(self.q.dim());
        let mut dk = Array2::<f32>::zeros(self.k.dim());
        let mut dv = Array2::<f32>::zeros(self.v.dim());

        for head in 0..config.num_heads {
            let (lo, hi) = (head * head_dim, (head + 1) * head_dim);
            let probs = self.attention.index_axis(Axis(0), head);
            let d_out = d_concat.slice(s![.., lo..hi]);

            let d_probs = d_out.dot(&self.v.slice(s![.., lo..hi]).reversed_axes());
            dv.slice_mut(s![.., lo..hi]).assign(&probs.t().dot(&d_out));

            let d_scores = softmax_rows_backward(probs, d_probs.view()) * scale;
            dq.slice_mut(s![.., lo..hi])
                .assign(&d_scores.dot(&self.k.slice(s![.., lo..hi])));
            dk.slice_mut(s![.., lo..hi])
                .assign(&d_scores.t().dot(&self.q.slice(s![.., lo..hi])));
        }

        write(layout, &mut grad, Param::Query, &self.h0.t().dot(&dq))?;
        write(layout, &mut grad, Param::Key, &self.h0.t().dot(&dk))?;
        write(layout, &mut grad, Param::Value, &self.h0.t().dot(&dv))?;

        let dh0 = dr1
            + dq.dot(&weights.view(Param::Query)?.t())
            + dk.dot(&weights.view(Param::Key)?.t())
            + dv.dot(&weights.view(Param::Value)?.t());

        // the positional encoding is constant, so the embedding gets all of dh0
        write(layout, &mut grad, Param::Embedding, &self.one_hot.t().dot(&dh0))?;

        Ok(grad)
    }
}

/// Runs the block over a single sequence.
///
/// # Returns
/// The forward cache, or an error if the sequence has the wrong length or an unknown token.
pub fn forward(weights: &TransformerWeights, tokens: &[usize]) -> Result<SequenceCache> {
    let config = weights.config();

    if tokens.len() != config.seq_len {
        return Err(MlErr::SizeMismatch {
            what: "sequence",
            got: tokens.len(),
            expected: config.seq_len,
        });
    }

    let one_hot = one_hot(tokens, config.vocab_size)?;
    let h0 = one_hot.dot(&weights.view(Param::Embedding)?)
        + positional_encoding(config.seq_len, config.d_model);

    let q = h0.dot(&weights.view(Param::Query)?);
    let k = h0.dot(&weights.view(Param::Key)?);
    let v = h0.dot(&weights.view(Param::Value)?);

    let head_dim = config.head_dim();
    let scale = 1.0 / (head_dim as f32).sqrt();
    let mut attention = Array3::<f32>::zeros((config.num_heads, config.seq_len, config.seq_len));
    let mut concat = Array2::<f32>::zeros((config.seq_len, config.d_model));

    for head in 0..config.num_heads {
        let (lo, hi) = (head * head_dim, (head + 1) * head_dim);

        let scores = q
            .slice(s![.., lo..hi])
            .dot(&k.slice(s![.., lo..hi]).reversed_axes())
            * scale;
        let probs = softmax_rows(scores.view());

        concat
            .slice_mut(s![.., lo..hi])
            .assign(&probs.dot(&v.slice(s![.., lo..hi])));
        attention.index_axis_mut(Axis(0), head).assign(&probs);
    }

    let r1 = &h0 + &concat.dot(&weights.view(Param::AttnOutput)?);
    let (n1, norm1) = layer_norm(
        r1.view(),
        weights.view(Param::Norm1Gain)?,
        weights.view(Param::Norm1Bias)?,
    );

    let f1 = n1.dot(&weights.view(Param::Ffn1)?) + &weights.view(Param::FfnBias1)?;
    let a1 = f1.mapv(|z| z.max(0.0));
    let f2 = a1.dot(&weights.view(Param::Ffn2)?) + &weights.view(Param::FfnBias2)?;

    let r2 = &n1 + &f2;
    let (n2, norm2) = layer_norm(
        r2.view(),
        weights.view(Param::Norm2Gain)?,
        weights.view(Param::Norm2Bias)?,
    );

    let logits = n2.dot(&weights.view(Param::Projection)?);

    Ok(SequenceCache {
        one_hot,
        h0,
        q,
        k,
        v,
        attention,
        concat,
        norm1,
        n1,
        f1,
        a1,
        norm2,
        n2,
        logits,
    })
}

fn column_sums(x: &Array2<f32>) -> Array2<f32> {
    x.sum_axis(Axis(0)).insert_axis(Axis(0))
}

fn write(layout: &ParamLayout, grad: &mut [f32], param: Param, value: &Array2<f32>) -> Result<()> {
    let mut view = layout.view_mut(grad, param)?;

    if view.dim() != value.dim() {
        return Err(MlErr::SizeMismatch {
            what: "parameter gradient",
            got: value.len(),
            expected: view.len(),
        });
    }

    view.assign(value);
    Ok(())
}
