use log::trace;
use ndarray::{Array3, ArrayView2};
use rayon::prelude::*;

use super::{TransformerWeights, block, encoding::one_hot};
use crate::{
    MlErr, Result,
    arch::loss::{LossFn, SoftmaxCrossEntropy},
    optimization::Optimizer,
};

/// What a transformer training step reports back.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformerStep {
    pub loss: f32,
    /// Fraction of positions, over the whole batch, predicted correctly after the update.
    pub accuracy: f32,
    /// The attention weights of the first sequence, `[num_heads, seq_len, seq_len]`.
    pub attention: Array3<f32>,
}

/// The output of the transformer for a single sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub prediction: Vec<usize>,
    pub attention: Array3<f32>,
}

/// Computes the mean cross-entropy of the batch and its gradient with respect to every
/// parameter.
///
/// Sequences are processed in parallel, their gradients are then summed in batch order so the
/// result doesn't depend on the scheduling.
pub fn batch_gradient(
    weights: &TransformerWeights,
    inputs: &[Vec<usize>],
    targets: &[Vec<usize>],
) -> Result<(f32, Vec<f32>)> {
    check_batch(inputs, targets)?;

    let vocab_size = weights.config().vocab_size;
    let batch = inputs.len() as f32;
    let loss_fn = SoftmaxCrossEntropy::new();

    let per_sequence = inputs
        .par_iter()
        .zip(targets)
        .map(|(input, target)| -> Result<(f32, Vec<f32>)> {
            if target.len() != input.len() {
                return Err(MlErr::SizeMismatch {
                    what: "target sequence",
                    got: target.len(),
                    expected: input.len(),
                });
            }

            let cache = block::forward(weights, input)?;
            let target = one_hot(target, vocab_size)?;

            let loss = loss_fn.loss(cache.logits(), target.view());
            let d_logits = loss_fn.loss_prime(cache.logits(), target.view()) / batch;
            let grad = cache.backward(weights, d_logits.view())?;

            Ok((loss, grad))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut loss = 0.0;
    let mut grad = vec![0.0; weights.len()];

    for (seq_loss, seq_grad) in per_sequence {
        loss += seq_loss;
        grad.iter_mut().zip(&seq_grad).for_each(|(g, s)| *g += s);
    }

    Ok((loss / batch, grad))
}

/// Trains the transformer on one batch.
///
/// The gradient comes from a differentiated pass over the batch, then the optimizer updates the
/// weights and a second, independent pass measures the accuracy with the updated weights.
///
/// # Arguments
/// * `weights` - The weights to train.
/// * `optimizer` - The optimizer, sized for `weights`.
/// * `inputs` - The input sequences.
/// * `targets` - The expected output sequences.
///
/// # Returns
/// The loss before the update, the accuracy after it and the first sequence's attention.
pub fn train_step<O: Optimizer>(
    weights: &mut TransformerWeights,
    optimizer: &mut O,
    inputs: &[Vec<usize>],
    targets: &[Vec<usize>],
) -> Result<TransformerStep> {
    let (loss, grad) = batch_gradient(weights, inputs, targets)?;
    optimizer.update_params(weights.params_mut(), &grad)?;

    let weights = &*weights;
    let correct = inputs
        .par_iter()
        .zip(targets)
        .map(|(input, target)| -> Result<usize> {
            let cache = block::forward(weights, input)?;
            let hits = argmax_rows(cache.logits())
                .into_iter()
                .zip(target)
                .filter(|(pred, target)| pred == *target)
                .count();

            Ok(hits)
        })
        .collect::<Result<Vec<usize>>>()?
        .into_iter()
        .sum::<usize>();

    let positions = inputs.len() * weights.config().seq_len;
    let accuracy = correct as f32 / positions as f32;
    let attention = block::forward(weights, &inputs[0])?.into_attention();

    trace!(loss = loss, accuracy = accuracy; "transformer step");

    Ok(TransformerStep {
        loss,
        accuracy,
        attention,
    })
}

/// Runs the transformer over a single sequence.
///
/// # Returns
/// The most likely token at every position and the attention weights of every head.
pub fn predict(weights: &TransformerWeights, sequence: &[usize]) -> Result<Prediction> {
    let cache = block::forward(weights, sequence)?;
    let prediction = argmax_rows(cache.logits());

    Ok(Prediction {
        prediction,
        attention: cache.into_attention(),
    })
}

fn check_batch(inputs: &[Vec<usize>], targets: &[Vec<usize>]) -> Result<()> {
    if inputs.is_empty() {
        return Err(MlErr::InvalidInput("a training batch needs at least one sequence"));
    }

    if inputs.len() != targets.len() {
        return Err(MlErr::SizeMismatch {
            what: "targets",
            got: targets.len(),
            expected: inputs.len(),
        });
    }

    Ok(())
}

/// Index of the largest logit of every row, the first one wins on ties.
fn argmax_rows(logits: ArrayView2<f32>) -> Vec<usize> {
    logits
        .rows()
        .into_iter()
        .map(|row| {
            let mut best = 0;
            for (i, &v) in row.iter().enumerate() {
                if v > row[best] {
                    best = i;
                }
            }
            best
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        optimization::{Adam, GradientDescent},
        transformer::{Param, TransformerConfig, generate_sort_batch},
    };
    use ndarray::Axis;
    use rand::{SeedableRng, rngs::StdRng};

    fn small_config() -> TransformerConfig {
        TransformerConfig {
            vocab_size: 5,
            seq_len: 4,
            d_model: 8,
            num_heads: 2,
            ffn_dim: 16,
        }
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = small_config();
        let mut weights = TransformerWeights::new(config, &mut rng).unwrap();
        let batch = generate_sort_batch(&mut rng, 3, config.seq_len, config.vocab_size).unwrap();

        let (_, grad) = batch_gradient(&weights, &batch.inputs, &batch.targets).unwrap();

        let h = 5e-3;
        for param in Param::ALL {
            let range = weights.layout().range(param);
            for i in [range.start, (range.start + range.end) / 2] {
                let orig = weights.params()[i];

                weights.params_mut()[i] = orig + h;
                let (up, _) = batch_gradient(&weights, &batch.inputs, &batch.targets).unwrap();
                weights.params_mut()[i] = orig - h;
                let (down, _) = batch_gradient(&weights, &batch.inputs, &batch.targets).unwrap();
                weights.params_mut()[i] = orig;

                let numeric = (up - down) / (2.0 * h);
                let tol = 2e-3 + 0.05 * numeric.abs().max(grad[i].abs());
                assert!(
                    (numeric - grad[i]).abs() < tol,
                    "{param:?}[{i}]: numeric {numeric}, analytic {}",
                    grad[i]
                );
            }
        }
    }

    #[test]
    fn loss_decreases_along_the_negative_gradient() {
        let mut rng = StdRng::seed_from_u64(5);
        let config = small_config();
        let mut weights = TransformerWeights::new(config, &mut rng).unwrap();
        let batch = generate_sort_batch(&mut rng, 8, config.seq_len, config.vocab_size).unwrap();

        let mut optimizer = GradientDescent::new(0.05);
        let before = train_step(&mut weights, &mut optimizer, &batch.inputs, &batch.targets)
            .unwrap()
            .loss;
        let (after, _) = batch_gradient(&weights, &batch.inputs, &batch.targets).unwrap();

        assert!(after < before, "loss went from {before} to {after}");
    }

    #[test]
    fn attention_rows_sum_to_one() {
        let mut rng = StdRng::seed_from_u64(8);
        let config = small_config();
        let weights = TransformerWeights::new(config, &mut rng).unwrap();

        let prediction = predict(&weights, &[3, 1, 4, 1]).unwrap();

        assert_eq!(prediction.prediction.len(), 4);
        assert!(prediction.prediction.iter().all(|&t| t < config.vocab_size));
        assert_eq!(prediction.attention.dim(), (2, 4, 4));
        for head in prediction.attention.outer_iter() {
            for row in head.rows() {
                assert!((row.sum() - 1.0).abs() < 1e-5);
            }
        }
        assert!(prediction.attention.index_axis(Axis(0), 1).iter().all(|p| *p >= 0.0));
    }

    #[test]
    fn malformed_sequences_are_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let weights = TransformerWeights::new(small_config(), &mut rng).unwrap();

        assert!(matches!(
            predict(&weights, &[1, 2, 3]),
            Err(MlErr::SizeMismatch { .. })
        ));
        assert!(matches!(
            predict(&weights, &[1, 2, 3, 9]),
            Err(MlErr::TokenOutOfRange { token: 9, .. })
        ));
        assert!(batch_gradient(&weights, &[], &[]).is_err());
        assert!(batch_gradient(&weights, &[vec![0, 1, 2, 3]], &[]).is_err());
    }

    #[test]
    fn seeded_training_is_deterministic() {
        let run = || {
            let mut rng = StdRng::seed_from_u64(21);
            let config = small_config();
            let mut weights = TransformerWeights::new(config, &mut rng).unwrap();
            let mut adam = Adam::with_learning_rate(weights.len(), 0.01);

            (0..5)
                .map(|_| {
                    let batch =
                        generate_sort_batch(&mut rng, 16, config.seq_len, config.vocab_size)
                            .unwrap();
                    train_step(&mut weights, &mut adam, &batch.inputs, &batch.targets)
                        .unwrap()
                        .loss
                })
                .collect::<Vec<f32>>()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn learns_to_sort_short_sequences() {
        let mut rng = StdRng::seed_from_u64(1234);
        let config = TransformerConfig {
            vocab_size: 4,
            seq_len: 4,
            d_model: 16,
            num_heads: 2,
            ffn_dim: 32,
        };
        let mut weights = TransformerWeights::new(config, &mut rng).unwrap();
        let mut adam = Adam::with_learning_rate(weights.len(), 0.01);

        let mut accuracies = Vec::new();
        for _ in 0..400 {
            let batch = generate_sort_batch(&mut rng, 32, config.seq_len, config.vocab_size).unwrap();
            let step = train_step(&mut weights, &mut adam, &batch.inputs, &batch.targets).unwrap();
            accuracies.push(step.accuracy);
        }

        let tail = &accuracies[accuracies.len() - 20..];
        let mean = tail.iter().sum::<f32>() / tail.len() as f32;
        assert!(mean >= 0.7, "mean accuracy of the last steps was {mean}");
    }
}
