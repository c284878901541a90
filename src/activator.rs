//! Activation function types.

use crate::error::ConfigError;

use ndarray::{ArrayBase, Array1, Data, Ix1};
use std::str::FromStr;

/// [Activation function](https://en.wikipedia.org/wiki/Activation_function)
/// types.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activator {
    /// Logistic sigmoid, `1 / (1 + e^-x)`
    Sigmoid,
    /// Rectified Linear Unit, `max(0, x)`
    ReLU,
}

impl Activator {
    /// Evaluates `f(x)` for the selected activation function.
    pub fn f(&self, x: f64) -> f64 {
        match *self {
            Activator::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activator::ReLU => if x > 0.0 { x } else { 0.0 },
        }
    }

    /// Evaluates the derivative `f'(z)` at the pre-activation value `z`.
    ///
    /// ReLU uses a subgradient of 1 at `z = 0`.
    pub fn derivative(&self, z: f64) -> f64 {
        match *self {
            Activator::Sigmoid => {
                let s = self.f(z);
                s * (1.0 - s)
            }
            Activator::ReLU => if z < 0.0 { 0.0 } else { 1.0 },
        }
    }

    /// Applies `f` to every element of `z`.
    pub fn apply<S>(&self, z: &ArrayBase<S, Ix1>) -> Array1<f64>
        where S: Data<Elem = f64>
    {
        z.mapv(|x| self.f(x))
    }

    /// Evaluates `f'` at every element of `z`.
    pub fn derivatives<S>(&self, z: &ArrayBase<S, Ix1>) -> Array1<f64>
        where S: Data<Elem = f64>
    {
        z.mapv(|x| self.derivative(x))
    }
}

impl Default for Activator {
    fn default() -> Self {
        Activator::Sigmoid
    }
}

impl FromStr for Activator {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Sigmoid" => Ok(Activator::Sigmoid),
            "ReLU" => Ok(Activator::ReLU),
            other => Err(ConfigError::UnknownActivator(other.to_owned())),
        }
    }
}

/// A per-layer setting: either one value shared by every layer, or exactly
/// one value per layer.
///
/// A single-element list is treated like a shared value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PerLayer<T> {
    Shared(T),
    Layers(Vec<T>),
}

impl<T: Clone> PerLayer<T> {
    /// Expands the setting to exactly `depth` values.
    ///
    /// Returns the number of values provided when it can't be matched to
    /// `depth`.
    pub fn resolve(&self, depth: usize) -> Result<Vec<T>, usize> {
        match self {
            PerLayer::Shared(value) => Ok(vec![value.clone(); depth]),
            PerLayer::Layers(values) if values.len() == 1 => {
                Ok(vec![values[0].clone(); depth])
            }
            PerLayer::Layers(values) if values.len() == depth => {
                Ok(values.clone())
            }
            PerLayer::Layers(values) => Err(values.len()),
        }
    }
}

impl<T: Default> Default for PerLayer<T> {
    fn default() -> Self {
        PerLayer::Shared(T::default())
    }
}

impl<T> From<T> for PerLayer<T> {
    fn from(value: T) -> Self {
        PerLayer::Shared(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn sigmoid_at_zero_is_half() {
        assert_eq!(Activator::Sigmoid.f(0.0), 0.5);
        assert_eq!(Activator::Sigmoid.derivative(0.0), 0.25);
    }

    #[test]
    fn sigmoid_derivative_matches_finite_difference() {
        let h = 1e-6;
        for &x in &[-3.0, -0.5, 0.0, 0.7, 2.5] {
            let numeric = (Activator::Sigmoid.f(x + h)
                - Activator::Sigmoid.f(x - h))
                / (2.0 * h);
            assert_abs_diff_eq!(Activator::Sigmoid.derivative(x),
                                numeric,
                                epsilon = 1e-8);
        }
    }

    #[test]
    fn relu_values() {
        let out = Activator::ReLU.apply(&array![-2.0, -0.0, 0.0, 3.5]);
        assert_eq!(out, array![0.0, 0.0, 0.0, 3.5]);
    }

    #[test]
    fn relu_subgradient_at_zero_is_one() {
        assert_eq!(Activator::ReLU.derivative(-1e-12), 0.0);
        assert_eq!(Activator::ReLU.derivative(0.0), 1.0);
        assert_eq!(Activator::ReLU.derivative(4.0), 1.0);
    }

    #[test]
    fn parse_names() {
        assert_eq!("Sigmoid".parse::<Activator>(), Ok(Activator::Sigmoid));
        assert_eq!(" ReLU ".parse::<Activator>(), Ok(Activator::ReLU));
        assert_eq!("tanh".parse::<Activator>(),
                   Err(ConfigError::UnknownActivator("tanh".into())));
    }

    #[test]
    fn per_layer_resolution() {
        let shared = PerLayer::Shared(Activator::ReLU);
        assert_eq!(shared.resolve(3), Ok(vec![Activator::ReLU; 3]));

        let single = PerLayer::Layers(vec![Activator::Sigmoid]);
        assert_eq!(single.resolve(2), Ok(vec![Activator::Sigmoid; 2]));

        let layers = PerLayer::Layers(vec![Activator::ReLU, Activator::Sigmoid]);
        assert_eq!(layers.resolve(2),
                   Ok(vec![Activator::ReLU, Activator::Sigmoid]));
        assert_eq!(layers.resolve(3), Err(2));
    }

    #[test]
    fn per_layer_from_json() {
        let shared: PerLayer<Activator> =
            serde_json::from_str("\"ReLU\"").unwrap();
        assert_eq!(shared, PerLayer::Shared(Activator::ReLU));

        let layers: PerLayer<Activator> =
            serde_json::from_str("[\"ReLU\", \"Sigmoid\"]").unwrap();
        assert_eq!(layers,
                   PerLayer::Layers(vec![Activator::ReLU, Activator::Sigmoid]));
    }
}
