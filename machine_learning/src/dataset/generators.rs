use std::f64::consts::{PI, TAU};

use rand::Rng;

use super::Point2D;
use crate::math::{random_gaussian, random_uniform};

/// Two concentric classes: an inner disc (label 0) and an outer ring (label 1).
///
/// # Arguments
/// * `rng` - A random number generator.
/// * `n` - The amount of points, the first half goes to the inner disc.
/// * `noise` - Standard deviation of the noise added to both coordinates.
pub fn generate_circle_data<R: Rng + ?Sized>(rng: &mut R, n: usize, noise: f64) -> Vec<Point2D> {
    let half = n as f64 / 2.0;

    (0..n)
        .map(|i| {
            let (label, radius) = if (i as f64) < half {
                (0, random_uniform(rng, 0.0, 0.4))
            } else {
                (1, random_uniform(rng, 0.6, 1.0))
            };

            let angle = random_uniform(rng, 0.0, TAU);
            let x = radius * angle.cos() + random_gaussian(rng, 0.0, noise);
            let y = radius * angle.sin() + random_gaussian(rng, 0.0, noise);
            Point2D::labeled(x, y, label)
        })
        .collect()
}

/// Two interleaved spiral arms of `n / 2` points each, offset by half a turn.
pub fn generate_spiral_data<R: Rng + ?Sized>(rng: &mut R, n: usize, noise: f64) -> Vec<Point2D> {
    let per_arm = n / 2;
    let mut points = Vec::with_capacity(per_arm * 2);

    for label in 0..2 {
        let offset = label as f64 * PI;

        for i in 0..per_arm {
            let r = i as f64 / per_arm as f64;
            let t = 1.75 * r * TAU + offset;
            let x = r * t.sin() + random_gaussian(rng, 0.0, noise);
            let y = r * t.cos() + random_gaussian(rng, 0.0, noise);
            points.push(Point2D::labeled(x, y, label));
        }
    }

    points
}

/// Uniform points in `[-1, 1]²` labeled 1 when the signs of `x` and `y` differ.
///
/// The label is computed after the noise has been added.
pub fn generate_xor_data<R: Rng + ?Sized>(rng: &mut R, n: usize, noise: f64) -> Vec<Point2D> {
    (0..n)
        .map(|_| {
            let x = random_uniform(rng, -1.0, 1.0) + random_gaussian(rng, 0.0, noise);
            let y = random_uniform(rng, -1.0, 1.0) + random_gaussian(rng, 0.0, noise);
            let label = usize::from((x > 0.0) != (y > 0.0));
            Point2D::labeled(x, y, label)
        })
        .collect()
}

/// `k` Gaussian blobs whose centers sit evenly on a circle of radius 0.5.
///
/// Each cluster gets `n / k` points, so the total may fall short of `n`.
pub fn generate_gaussian_clusters<R: Rng + ?Sized>(
    rng: &mut R,
    n: usize,
    k: usize,
    spread: f64,
) -> Vec<Point2D> {
    if k == 0 {
        return Vec::new();
    }

    let per_cluster = n / k;
    let mut points = Vec::with_capacity(per_cluster * k);

    for label in 0..k {
        let angle = TAU * label as f64 / k as f64;
        let (cx, cy) = (0.5 * angle.cos(), 0.5 * angle.sin());

        for _ in 0..per_cluster {
            let x = random_gaussian(rng, cx, spread);
            let y = random_gaussian(rng, cy, spread);
            points.push(Point2D::labeled(x, y, label));
        }
    }

    points
}

/// Two interleaving half circles of `n / 2` points each.
pub fn generate_moons_data<R: Rng + ?Sized>(rng: &mut R, n: usize, noise: f64) -> Vec<Point2D> {
    let per_moon = n / 2;
    let mut points = Vec::with_capacity(per_moon * 2);
    let angle = |i: usize| {
        if per_moon > 1 {
            PI * i as f64 / (per_moon - 1) as f64
        } else {
            0.0
        }
    };

    for i in 0..per_moon {
        let a = angle(i);
        let x = a.cos() + random_gaussian(rng, 0.0, noise);
        let y = a.sin() + random_gaussian(rng, 0.0, noise);
        points.push(Point2D::labeled(x, y, 0));
    }

    for i in 0..per_moon {
        let a = angle(i);
        let x = 1.0 - a.cos() + random_gaussian(rng, 0.0, noise);
        let y = 0.5 - a.sin() + random_gaussian(rng, 0.0, noise);
        points.push(Point2D::labeled(x, y, 1));
    }

    points
}

/// Unlabeled points around the line `y = slope * x + intercept`.
pub fn generate_linear_data<R: Rng + ?Sized>(
    rng: &mut R,
    n: usize,
    slope: f64,
    intercept: f64,
    noise: f64,
) -> Vec<Point2D> {
    (0..n)
        .map(|_| {
            let x = random_uniform(rng, -1.0, 1.0);
            let y = slope * x + intercept + random_gaussian(rng, 0.0, noise);
            Point2D::new(x, y)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn count_label(points: &[Point2D], label: usize) -> usize {
        points.iter().filter(|p| p.label == Some(label)).count()
    }

    #[test]
    fn circle_keeps_every_point() {
        let mut rng = StdRng::seed_from_u64(0);
        let points = generate_circle_data(&mut rng, 11, 0.0);

        assert_eq!(points.len(), 11);
        assert_eq!(count_label(&points, 0), 6);
        assert_eq!(count_label(&points, 1), 5);

        for p in &points {
            let r = p.x.hypot(p.y);
            match p.label {
                Some(0) => assert!(r <= 0.4 + 1e-12),
                Some(1) => assert!((0.6 - 1e-12..=1.0 + 1e-12).contains(&r)),
                _ => panic!("unexpected label {:?}", p.label),
            }
        }
    }

    #[test]
    fn spiral_truncates_odd_counts() {
        let mut rng = StdRng::seed_from_u64(0);
        let points = generate_spiral_data(&mut rng, 101, 0.0);

        assert_eq!(points.len(), 100);
        assert_eq!(count_label(&points, 0), 50);
        assert_eq!(count_label(&points, 1), 50);
    }

    #[test]
    fn xor_labels_follow_quadrants() {
        let mut rng = StdRng::seed_from_u64(3);
        let points = generate_xor_data(&mut rng, 200, 0.1);

        assert_eq!(points.len(), 200);
        for p in &points {
            let expected = usize::from((p.x > 0.0) != (p.y > 0.0));
            assert_eq!(p.label, Some(expected));
        }
    }

    #[test]
    fn gaussian_clusters_are_balanced() {
        let mut rng = StdRng::seed_from_u64(5);
        let points = generate_gaussian_clusters(&mut rng, 90, 3, 0.1);

        assert_eq!(points.len(), 90);
        for label in 0..3 {
            assert_eq!(count_label(&points, label), 30);
        }

        let points = generate_gaussian_clusters(&mut rng, 100, 3, 0.1);
        assert_eq!(points.len(), 99);
        assert!(generate_gaussian_clusters(&mut rng, 10, 0, 0.1).is_empty());
    }

    #[test]
    fn moons_truncate_odd_counts_and_sit_on_arcs() {
        let mut rng = StdRng::seed_from_u64(9);
        let points = generate_moons_data(&mut rng, 41, 0.0);

        assert_eq!(points.len(), 40);
        for p in &points {
            match p.label {
                Some(0) => assert!((p.x.hypot(p.y) - 1.0).abs() < 1e-9 && p.y >= -1e-9),
                Some(1) => {
                    let r = (p.x - 1.0).hypot(p.y - 0.5);
                    assert!((r - 1.0).abs() < 1e-9 && p.y <= 0.5 + 1e-9);
                }
                _ => panic!("unexpected label {:?}", p.label),
            }
        }
    }

    #[test]
    fn linear_data_is_unlabeled_and_on_the_line() {
        let mut rng = StdRng::seed_from_u64(2);
        let points = generate_linear_data(&mut rng, 25, 2.0, 1.0, 0.0);

        assert_eq!(points.len(), 25);
        for p in &points {
            assert!(p.label.is_none());
            assert!((-1.0..1.0).contains(&p.x));
            assert!((p.y - (2.0 * p.x + 1.0)).abs() < 1e-12);
        }
    }
}
