//! Plain gradient descent over the analytic surfaces of [`Surface`].

mod path;
mod surface;

pub use path::DescentPath;
pub use surface::Surface;

/// Gradients longer than this are scaled down to it, keeping their direction.
pub const MAX_GRADIENT_NORM: f64 = 50.0;

/// Evaluates `surface` at `(x, y)`.
pub fn evaluate_surface(x: f64, y: f64, surface: Surface) -> f64 {
    surface.evaluate(x, y)
}

/// The gradient of `surface` at `(x, y)`.
pub fn compute_gradient(x: f64, y: f64, surface: Surface) -> (f64, f64) {
    surface.gradient(x, y)
}

/// Takes one descent step from `(x, y)`.
///
/// # Arguments
/// * `x` - The current first coordinate.
/// * `y` - The current second coordinate.
/// * `learning_rate` - The step length relative to the (clipped) gradient.
/// * `surface` - The surface being descended.
///
/// # Returns
/// The new position.
pub fn gradient_step(x: f64, y: f64, learning_rate: f64, surface: Surface) -> (f64, f64) {
    let (mut gx, mut gy) = surface.gradient(x, y);

    let norm = gx.hypot(gy);
    if norm > MAX_GRADIENT_NORM {
        let scale = MAX_GRADIENT_NORM / norm;
        gx *= scale;
        gy *= scale;
    }

    (x - learning_rate * gx, y - learning_rate * gy)
}
