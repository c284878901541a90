//! Random initialization of network parameters.

use crate::activator::PerLayer;
use crate::error::ConfigError;

use ndarray::{Array1, Array2};
use rand::Rng;
use rand_distr::{Distribution as _, Normal, Uniform};

/// A distribution to draw initial weights or biases from.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Distribution {
    /// Uniform over `[lb, rb)`.
    Uniform { lb: f64, rb: f64 },
    /// Normal with the given mean and standard deviation.
    Gaussian { mean: f64, sd: f64 },
}

impl Distribution {
    /// Checks that the distribution can be sampled from.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Distribution::Uniform { lb, rb } => {
                if !(lb.is_finite() && rb.is_finite() && lb < rb) {
                    return Err(ConfigError::InvalidDistribution(format!(
                        "Uniform({}, {}) needs finite bounds with lb < rb",
                        lb, rb)));
                }
            }
            Distribution::Gaussian { mean, sd } => {
                if !(mean.is_finite() && sd.is_finite() && sd >= 0.0) {
                    return Err(ConfigError::InvalidDistribution(format!(
                        "Gaussian({}, {}) needs a finite mean and sd >= 0",
                        mean, sd)));
                }
            }
        }
        Ok(())
    }

    fn sampler(&self) -> Result<Sampler, ConfigError> {
        self.validate()?;
        Ok(match *self {
            Distribution::Uniform { lb, rb } => {
                Sampler::Uniform(Uniform::new(lb, rb))
            }
            Distribution::Gaussian { mean, sd } => {
                let normal = Normal::new(mean, sd).map_err(|e| {
                    ConfigError::InvalidDistribution(e.to_string())
                })?;
                Sampler::Gaussian(normal)
            }
        })
    }
}

enum Sampler {
    Uniform(Uniform<f64>),
    Gaussian(Normal<f64>),
}

impl Sampler {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Sampler::Uniform(d) => d.sample(rng),
            Sampler::Gaussian(d) => d.sample(rng),
        }
    }
}

/// Randomly initialized weights and biases for a network with the given
/// neuron counts per layer.
///
/// `layer_sizes` includes the input layer, so `[784, 16, 10]` produces two
/// weight matrices of shapes `16 × 784` and `10 × 16`.
pub fn random_parameters<R>(layer_sizes: &[usize],
                            weights: &PerLayer<Distribution>,
                            biases: &PerLayer<Distribution>,
                            rng: &mut R)
                            -> Result<(Vec<Array2<f64>>, Vec<Array1<f64>>),
                                      ConfigError>
    where R: Rng + ?Sized
{
    if layer_sizes.len() < 2 || layer_sizes.contains(&0) {
        return Err(ConfigError::LayerSizes(layer_sizes.to_vec()));
    }
    let depth = layer_sizes.len() - 1;
    let weight_dists = resolve(weights, depth)?;
    let bias_dists = resolve(biases, depth)?;

    let mut ws = Vec::with_capacity(depth);
    let mut bs = Vec::with_capacity(depth);
    for (i, sizes) in layer_sizes.windows(2).enumerate() {
        let (inputs, outputs) = (sizes[0], sizes[1]);
        let w = weight_dists[i].sampler()?;
        let b = bias_dists[i].sampler()?;
        ws.push(Array2::from_shape_simple_fn((outputs, inputs),
                                             || w.sample(&mut *rng)));
        bs.push(Array1::from_shape_simple_fn(outputs, || b.sample(&mut *rng)));
    }
    Ok((ws, bs))
}

fn resolve(dists: &PerLayer<Distribution>,
           depth: usize)
           -> Result<Vec<Distribution>, ConfigError> {
    dists.resolve(depth).map_err(|actual| {
        ConfigError::DistributionCount {
            expected: depth,
            actual,
        }
    })
}
