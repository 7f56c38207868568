use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::MlErr;

/// Step used by the central differences of surfaces without a closed form gradient.
const FINITE_DIFF_STEP: f64 = 1e-5;

/// A scalar field over the plane that gradient descent can be run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Surface {
    #[default]
    Bowl,
    Saddle,
    Rosenbrock,
    Beale,
}
use Surface::*;

impl Surface {
    pub const ALL: [Surface; 4] = [Bowl, Saddle, Rosenbrock, Beale];

    /// Evaluates the surface at `(x, y)`.
    pub fn evaluate(self, x: f64, y: f64) -> f64 {
        match self {
            Bowl => x * x + y * y,
            Saddle => x * x - y * y,
            Rosenbrock => (1.0 - x).powi(2) + 100.0 * (y - x * x).powi(2),
            Beale => {
                (1.5 - x + x * y).powi(2)
                    + (2.25 - x + x * y * y).powi(2)
                    + (2.625 - x + x * y.powi(3)).powi(2)
            }
        }
    }

    /// The gradient of the surface at `(x, y)`.
    ///
    /// Beale's gradient is approximated with central differences, every other surface has a
    /// closed form.
    pub fn gradient(self, x: f64, y: f64) -> (f64, f64) {
        match self {
            Bowl => (2.0 * x, 2.0 * y),
            Saddle => (2.0 * x, -2.0 * y),
            Rosenbrock => (
                -2.0 * (1.0 - x) - 400.0 * x * (y - x * x),
                200.0 * (y - x * x),
            ),
            Beale => {
                let h = FINITE_DIFF_STEP;
                let dx = (self.evaluate(x + h, y) - self.evaluate(x - h, y)) / (2.0 * h);
                let dy = (self.evaluate(x, y + h) - self.evaluate(x, y - h)) / (2.0 * h);
                (dx, dy)
            }
        }
    }

    /// The global minimum of the surface, `None` if it's unbounded below.
    pub fn minimum(self) -> Option<(f64, f64)> {
        match self {
            Bowl => Some((0.0, 0.0)),
            Saddle => None,
            Rosenbrock => Some((1.0, 1.0)),
            Beale => Some((3.0, 0.5)),
        }
    }

    /// The `((min_x, max_x), (min_y, max_y))` region worth plotting.
    pub fn domain(self) -> ((f64, f64), (f64, f64)) {
        match self {
            Bowl | Saddle => ((-2.0, 2.0), (-2.0, 2.0)),
            Rosenbrock => ((-2.0, 2.0), (-1.0, 3.0)),
            Beale => ((-4.5, 4.5), (-4.5, 4.5)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Bowl => "bowl",
            Saddle => "saddle",
            Rosenbrock => "rosenbrock",
            Beale => "beale",
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Surface {
    type Err = MlErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Surface::ALL
            .into_iter()
            .find(|surface| surface.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| MlErr::InvalidConfig(format!("unknown surface {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradients_match_finite_differences() {
        let h = 1e-6;
        let points = [(0.3, -0.7), (-1.2, 0.4), (1.5, 1.1), (2.0, -0.3)];

        for surface in Surface::ALL {
            for (x, y) in points {
                let (gx, gy) = surface.gradient(x, y);
                let nx = (surface.evaluate(x + h, y) - surface.evaluate(x - h, y)) / (2.0 * h);
                let ny = (surface.evaluate(x, y + h) - surface.evaluate(x, y - h)) / (2.0 * h);

                let tol = 1e-3 * (1.0 + nx.abs().max(ny.abs()));
                assert!((gx - nx).abs() < tol, "{surface} d/dx at ({x}, {y}): {gx} vs {nx}");
                assert!((gy - ny).abs() < tol, "{surface} d/dy at ({x}, {y}): {gy} vs {ny}");
            }
        }
    }

    #[test]
    fn minima_are_zero() {
        for surface in Surface::ALL {
            if let Some((x, y)) = surface.minimum() {
                assert!(surface.evaluate(x, y).abs() < 1e-12, "{surface}");
                let (gx, gy) = surface.gradient(x, y);
                assert!(gx.abs() < 1e-4 && gy.abs() < 1e-4, "{surface}");
            }
        }
    }

    #[test]
    fn saddle_curves_both_ways() {
        assert_eq!(Saddle.evaluate(1.0, 0.0), 1.0);
        assert_eq!(Saddle.evaluate(0.0, 1.0), -1.0);
    }

    #[test]
    fn names_parse_back() {
        for surface in Surface::ALL {
            assert_eq!(surface.name().parse::<Surface>().unwrap(), surface);
        }

        assert_eq!("Rosenbrock".parse::<Surface>().unwrap(), Rosenbrock);
        assert!("mountain".parse::<Surface>().is_err());
        assert_eq!(serde_json::to_string(&Beale).unwrap(), "\"beale\"");
    }
}
