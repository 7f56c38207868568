mod generators;
mod point;

use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub use generators::{
    generate_circle_data, generate_gaussian_clusters, generate_linear_data, generate_moons_data,
    generate_spiral_data, generate_xor_data,
};
pub use point::Point2D;

/// The labeled point clouds a classifier can be trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DatasetKind {
    #[default]
    Circle,
    Spiral,
    Xor,
    Gaussian,
    Moons,
}

impl DatasetKind {
    /// Generates `n` points of this kind.
    ///
    /// For `Gaussian`, `noise` is used as the cluster spread and two clusters are drawn.
    pub fn generate<R: Rng + ?Sized>(self, rng: &mut R, n: usize, noise: f64) -> Vec<Point2D> {
        match self {
            DatasetKind::Circle => generate_circle_data(rng, n, noise),
            DatasetKind::Spiral => generate_spiral_data(rng, n, noise),
            DatasetKind::Xor => generate_xor_data(rng, n, noise),
            DatasetKind::Gaussian => generate_gaussian_clusters(rng, n, 2, noise),
            DatasetKind::Moons => generate_moons_data(rng, n, noise),
        }
    }
}

/// Turns a point cloud into `(xs, ys)` training matrices.
///
/// # Returns
/// `xs` with shape `[n, 2]` and `ys` with shape `[n, 1]`. Unlabeled points get a target of 0.
pub fn to_arrays(points: &[Point2D]) -> (Array2<f32>, Array2<f32>) {
    let n = points.len();
    let xs = Array2::from_shape_fn((n, 2), |(i, j)| {
        let p = &points[i];
        if j == 0 { p.x as f32 } else { p.y as f32 }
    });
    let ys = Array2::from_shape_fn((n, 1), |(i, _)| points[i].label.unwrap_or(0) as f32);

    (xs, ys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_arrays_keeps_row_order() {
        let points = [Point2D::labeled(1.0, 2.0, 1), Point2D::new(-3.0, 4.0)];
        let (xs, ys) = to_arrays(&points);

        assert_eq!(xs.dim(), (2, 2));
        assert_eq!(xs.row(0).to_vec(), vec![1.0, 2.0]);
        assert_eq!(xs.row(1).to_vec(), vec![-3.0, 4.0]);
        assert_eq!(ys.column(0).to_vec(), vec![1.0, 0.0]);
    }

    #[test]
    fn kind_names_round_trip_through_json() {
        let kind: DatasetKind = serde_json::from_str("\"moons\"").unwrap();
        assert_eq!(kind, DatasetKind::Moons);
    }
}
