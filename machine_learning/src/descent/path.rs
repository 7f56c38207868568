use super::{Surface, gradient_step};

/// The successive positions of a descent, one `gradient_step` per item.
///
/// The path ends once the position stops being finite, e.g. after diverging on a saddle.
#[derive(Debug, Clone)]
pub struct DescentPath {
    surface: Surface,
    learning_rate: f64,
    position: (f64, f64),
}

impl DescentPath {
    /// Creates a new `DescentPath`.
    ///
    /// # Arguments
    /// * `surface` - The surface to descend.
    /// * `start` - The starting position, not yielded.
    /// * `learning_rate` - The step length.
    pub fn new(surface: Surface, start: (f64, f64), learning_rate: f64) -> Self {
        Self {
            surface,
            learning_rate,
            position: start,
        }
    }

    pub fn position(&self) -> (f64, f64) {
        self.position
    }
}

impl Iterator for DescentPath {
    type Item = (f64, f64);

    fn next(&mut self) -> Option<Self::Item> {
        let (x, y) = self.position;
        if !x.is_finite() || !y.is_finite() {
            return None;
        }

        let next = gradient_step(x, y, self.learning_rate, self.surface);
        if !next.0.is_finite() || !next.1.is_finite() {
            self.position = next;
            return None;
        }

        self.position = next;
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bowl_descent_reaches_the_minimum() {
        let (x, y) = DescentPath::new(Surface::Bowl, (1.5, -1.0), 0.1)
            .take(200)
            .last()
            .unwrap();

        assert!(x.abs() < 1e-6 && y.abs() < 1e-6);
    }

    #[test]
    fn rosenbrock_descent_makes_progress() {
        let start = (-1.0, 1.0);
        let before = Surface::Rosenbrock.evaluate(start.0, start.1);
        let (x, y) = DescentPath::new(Surface::Rosenbrock, start, 0.001)
            .take(5000)
            .last()
            .unwrap();

        assert!(Surface::Rosenbrock.evaluate(x, y) < before);
    }

    #[test]
    fn non_finite_start_yields_nothing() {
        assert_eq!(DescentPath::new(Surface::Bowl, (f64::NAN, 0.0), 0.1).count(), 0);
    }
}
