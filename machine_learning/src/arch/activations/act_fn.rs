/// A non-linear, element-wise activation function.
///
/// The identity is not represented here, layers without activation carry `None` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActFn {
    Relu,
    Sigmoid,
    Tanh,
}
use ActFn::*;

impl ActFn {
    /// Applies the function to the pre-activation `z`.
    pub fn f(&self, z: f32) -> f32 {
        match self {
            Relu => z.max(0.0),
            Sigmoid => sigmoid(z),
            Tanh => z.tanh(),
        }
    }

    /// The derivative of the function evaluated at the pre-activation `z`.
    pub fn df(&self, z: f32) -> f32 {
        match self {
            Relu => {
                if z > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Sigmoid => {
                let s = sigmoid(z);
                s * (1.0 - s)
            }
            Tanh => 1.0 - z.tanh().powi(2),
        }
    }
}

fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivatives_match_finite_differences() {
        let h = 1e-3;

        for act_fn in [Relu, Sigmoid, Tanh] {
            for z in [-2.0f32, -0.5, 0.3, 1.7] {
                let numeric = (act_fn.f(z + h) - act_fn.f(z - h)) / (2.0 * h);
                assert!(
                    (numeric - act_fn.df(z)).abs() < 1e-2,
                    "{act_fn:?} at {z}: {numeric} vs {}",
                    act_fn.df(z)
                );
            }
        }
    }

    #[test]
    fn sigmoid_is_centered() {
        assert_eq!(Sigmoid.f(0.0), 0.5);
        assert_eq!(Sigmoid.df(0.0), 0.25);
    }
}
