//! Small numeric helpers shared by every algorithm in the crate.

use std::f64::consts::TAU;

use rand::Rng;

use crate::dataset::Point2D;

/// Restricts `value` to the closed range `[min, max]`.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Linear interpolation between `a` and `b`, `t = 0` gives `a` and `t = 1` gives `b`.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Euclidean distance between two points.
pub fn distance(a: &Point2D, b: &Point2D) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Maps `value` from `[min, max]` into `[0, 1]`.
///
/// A degenerate range (`min == max`) maps everything to `0.5`.
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if min == max {
        return 0.5;
    }

    (value - min) / (max - min)
}

/// Inverse of [`normalize`], maps `t` from `[0, 1]` back into `[min, max]`.
pub fn denormalize(t: f64, min: f64, max: f64) -> f64 {
    min + t * (max - min)
}

/// Numerically stable softmax.
///
/// The maximum is subtracted before exponentiating so large inputs never overflow.
///
/// # Arguments
/// * `values` - The raw scores.
///
/// # Returns
/// A probability vector of the same length as `values`.
pub fn softmax(values: &[f64]) -> Vec<f64> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = values.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = exps.iter().sum();

    exps.into_iter().map(|e| e / sum).collect()
}

/// Index of the maximum value, the first one wins on ties.
///
/// # Returns
/// `None` if `values` is empty.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;

    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, max)) if v <= max => {}
            _ => best = Some((i, v)),
        }
    }

    best.map(|(i, _)| i)
}

/// Mean squared error between two equally sized slices, `0` for empty input.
pub fn mean_squared_error(predictions: &[f64], targets: &[f64]) -> f64 {
    if predictions.is_empty() {
        return 0.0;
    }

    let sum: f64 = predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| (p - t).powi(2))
        .sum();

    sum / predictions.len() as f64
}

/// Samples `N(mean, std)` with the Box-Muller transform.
pub fn random_gaussian<R: Rng + ?Sized>(rng: &mut R, mean: f64, std: f64) -> f64 {
    // u1 lies in (0, 1] so the logarithm stays finite
    let u1 = 1.0 - rng.random::<f64>();
    let u2 = rng.random::<f64>();
    let z = (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos();

    mean + std * z
}

/// Samples uniformly from `[min, max)`.
pub fn random_uniform<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    min + (max - min) * rng.random::<f64>()
}
