use log::{debug, warn};
use rand::{Rng, seq::index};
use rayon::prelude::*;
use serde::Serialize;

use crate::{MlErr, Result, dataset::Point2D, math::distance};

/// Maximum distance a centroid may move for the clustering to be considered converged.
const CONVERGENCE_TOLERANCE: f64 = 1e-6;

/// The outcome of a single k-means iteration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KMeansStep {
    pub centroids: Vec<Point2D>,
    pub assignments: Vec<usize>,
    pub converged: bool,
}

/// Lloyd's k-means over points in the plane.
///
/// `k` is fixed for the lifetime of the instance, a different `k` means a new instance.
#[derive(Debug, Clone)]
pub struct KMeans {
    k: usize,
    centroids: Vec<Point2D>,
}

impl KMeans {
    /// Creates a new `KMeans` without centroids.
    ///
    /// # Returns
    /// An error if `k` is zero.
    pub fn new(k: usize) -> Result<Self> {
        if k == 0 {
            return Err(MlErr::InvalidInput("k-means needs at least one cluster"));
        }

        Ok(Self {
            k,
            centroids: Vec::new(),
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn centroids(&self) -> &[Point2D] {
        &self.centroids
    }

    /// Forgets the current centroids, the next `step` initializes again.
    pub fn reset(&mut self) {
        self.centroids.clear();
    }

    /// Picks the initial centroids among `points`, without replacement.
    ///
    /// If there are fewer points than clusters, only `points.len()` centroids are created.
    pub fn initialize<R: Rng + ?Sized>(&mut self, points: &[Point2D], rng: &mut R) {
        let amount = self.k.min(points.len());
        if amount < self.k {
            warn!("only {amount} point(s) available for {} clusters", self.k);
        }

        self.centroids = index::sample(rng, points.len(), amount)
            .into_iter()
            .map(|i| Point2D::new(points[i].x, points[i].y))
            .collect();
    }

    /// Finds the nearest centroid for each point.
    ///
    /// Centroids are scanned in order with a strict comparison, so ties go to the lowest index.
    ///
    /// # Returns
    /// One centroid index per point, or an empty vec if there are no centroids.
    pub fn assign_points(points: &[Point2D], centroids: &[Point2D]) -> Vec<usize> {
        if centroids.is_empty() {
            return Vec::new();
        }

        points
            .par_iter()
            .map(|p| {
                let mut best = 0;
                let mut best_dist = f64::INFINITY;

                for (i, c) in centroids.iter().enumerate() {
                    let dist = distance(p, c);
                    if dist < best_dist {
                        best = i;
                        best_dist = dist;
                    }
                }

                best
            })
            .collect()
    }

    /// Runs one iteration: assign every point, then move each centroid to the mean of its points.
    ///
    /// The very first call only initializes the centroids. Centroids without points stay put.
    pub fn step<R: Rng + ?Sized>(&mut self, points: &[Point2D], rng: &mut R) -> KMeansStep {
        if self.centroids.is_empty() {
            self.initialize(points, rng);

            return KMeansStep {
                centroids: self.centroids.clone(),
                assignments: Self::assign_points(points, &self.centroids),
                converged: false,
            };
        }

        let assignments = Self::assign_points(points, &self.centroids);
        let mut sums = vec![(0.0, 0.0, 0usize); self.centroids.len()];

        for (p, &c) in points.iter().zip(&assignments) {
            let (sx, sy, count) = &mut sums[c];
            *sx += p.x;
            *sy += p.y;
            *count += 1;
        }

        let updated: Vec<Point2D> = self
            .centroids
            .iter()
            .zip(&sums)
            .map(|(old, &(sx, sy, count))| {
                if count == 0 {
                    *old
                } else {
                    Point2D::new(sx / count as f64, sy / count as f64)
                }
            })
            .collect();

        let converged = self
            .centroids
            .iter()
            .zip(&updated)
            .all(|(old, new)| distance(old, new) < CONVERGENCE_TOLERANCE);

        self.centroids = updated;
        debug!(k = self.k, converged = converged; "k-means step");

        KMeansStep {
            centroids: self.centroids.clone(),
            assignments,
            converged,
        }
    }

    /// Sum of squared distances from every point to its nearest centroid.
    pub fn inertia(&self, points: &[Point2D]) -> f64 {
        Self::assign_points(points, &self.centroids)
            .into_iter()
            .zip(points)
            .map(|(c, p)| distance(p, &self.centroids[c]).powi(2))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn zero_clusters_is_rejected() {
        assert!(KMeans::new(0).is_err());
    }

    #[test]
    fn assigns_to_nearest_centroid() {
        let centroids = [Point2D::new(0.0, 0.0), Point2D::new(10.0, 10.0)];
        let points = [
            Point2D::new(1.0, 1.0),
            Point2D::new(9.0, 9.0),
            Point2D::new(0.5, 0.5),
            Point2D::new(8.0, 8.0),
        ];

        assert_eq!(KMeans::assign_points(&points, &centroids), vec![0, 1, 0, 1]);
    }

    #[test]
    fn ties_go_to_the_first_centroid() {
        // (1, 0) is exactly as far from both centroids, the lower index must win
        let centroids = [Point2D::new(0.0, 0.0), Point2D::new(2.0, 0.0)];
        let points = [Point2D::new(1.0, 0.0)];

        assert_eq!(KMeans::assign_points(&points, &centroids), vec![0]);
    }

    #[test]
    fn initialize_with_fewer_points_than_clusters() {
        let mut rng = StdRng::seed_from_u64(0);
        let points = [Point2D::new(1.0, 2.0), Point2D::new(3.0, 4.0)];
        let mut kmeans = KMeans::new(5).unwrap();

        kmeans.initialize(&points, &mut rng);

        assert_eq!(kmeans.centroids().len(), 2);
        for c in kmeans.centroids() {
            assert!(points.iter().any(|p| p.x == c.x && p.y == c.y));
        }
        assert_ne!(kmeans.centroids()[0], kmeans.centroids()[1]);
    }

    #[test]
    fn first_step_only_initializes() {
        let mut rng = StdRng::seed_from_u64(1);
        let points = [Point2D::new(0.0, 0.0), Point2D::new(5.0, 5.0), Point2D::new(6.0, 5.0)];
        let mut kmeans = KMeans::new(2).unwrap();

        let step = kmeans.step(&points, &mut rng);

        assert_eq!(step.centroids.len(), 2);
        assert_eq!(step.assignments.len(), 3);
        assert!(!step.converged);
    }

    #[test]
    fn empty_clusters_keep_their_centroid() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut kmeans = KMeans::new(2).unwrap();
        kmeans.centroids = vec![Point2D::new(0.0, 0.0), Point2D::new(100.0, 100.0)];

        let points = [Point2D::new(1.0, 0.0), Point2D::new(-1.0, 0.0)];
        let step = kmeans.step(&points, &mut rng);

        assert_eq!(step.centroids[0], Point2D::new(0.0, 0.0));
        assert_eq!(step.centroids[1], Point2D::new(100.0, 100.0));
        assert!(step.converged);
    }

    #[test]
    fn inertia_of_perfect_fit_is_zero() {
        let mut kmeans = KMeans::new(1).unwrap();
        kmeans.centroids = vec![Point2D::new(1.0, 1.0)];

        assert_eq!(kmeans.inertia(&[Point2D::new(1.0, 1.0)]), 0.0);
        assert_eq!(kmeans.inertia(&[Point2D::new(1.0, 3.0)]), 4.0);
    }
}
