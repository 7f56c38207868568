//! A single-block encoder transformer, small enough to train from scratch on toy tasks such as
//! sorting.
//!
//! Tokens are embedded through a one-hot matmul, summed with a sinusoidal positional encoding and
//! fed through multi-head self-attention and a ReLU feed-forward network, each followed by a
//! residual connection and a layer norm. A linear head turns every position into logits over the
//! vocabulary. The backward pass is written by hand over one flat parameter buffer.

mod block;
mod config;
mod data;
mod encoding;
mod norm;
mod train;
mod weights;

pub use block::{SequenceCache, forward};
pub use config::TransformerConfig;
pub use data::{SortBatch, generate_sort_batch};
pub use encoding::{one_hot, positional_encoding};
pub use train::{Prediction, TransformerStep, batch_gradient, predict, train_step};
pub use weights::{Param, ParamLayout, TransformerWeights};
