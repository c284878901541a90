//! A [Feedforward neural network]
//! (https://en.wikipedia.org/wiki/Feedforward_neural_network) trained by
//! backpropagation and gradient descent.
//!
//! # Example
//!
//! Build a small network, query it, and run one training step:
//!
//! ```
//! # use neurons_trainer::feed_forward::*;
//! use ndarray::{array, Array1, Array2};
//! use std::sync::Arc;
//!
//! // A 2-3-1 network with every parameter at zero outputs sigmoid(0).
//! let mut network = Network::builder(vec![Array2::zeros((3, 2)), Array2::zeros((1, 3))],
//!                                    vec![Array1::zeros(3), Array1::zeros(1)])
//!     .activators(Activator::Sigmoid)
//!     .learning_rate(0.5)
//!     .build()
//!     .unwrap();
//! assert_eq!(network.feed(&array![0.2, 0.9]).unwrap(), array![0.5]);
//!
//! // Inputs must be normalized to [0, 1].
//! assert!(network.feed(&array![0.2, 1.5]).is_err());
//!
//! let inputs = [array![0.0, 0.0], array![0.0, 1.0], array![1.0, 0.0], array![1.0, 1.0]];
//! let expected = [array![0.0], array![1.0], array![1.0], array![0.0]];
//! let metric = network.train(&inputs, &expected).unwrap();
//! assert_eq!(metric.data_used, 4);
//! assert!(Arc::ptr_eq(&metric.w, network.weights()));
//! ```

pub use crate::activator::{Activator, PerLayer};
pub use crate::learning_rate::LearningRate;
pub use crate::metric::{Biases, TrainMetric, Weights};

use crate::error::{ConfigError, DomainError, TrainError};
use crate::init::{self, Distribution};
use crate::layer::Layer;

use itertools::izip;
use ndarray::{Array1, Array2, ArrayBase, Data, Dimension, Ix1};
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, warn};

/// A Feedforward neural network
///
/// The network exclusively owns its weights and biases. Training never
/// writes into the current arrays; every update replaces them with new ones,
/// so snapshots handed out through `TrainMetric` stay valid.
#[derive(Clone, Debug)]
pub struct Network {
    weights: Weights,
    biases: Biases,
    activators: Vec<Activator>,
    learning_rate: LearningRate,
    data_used: usize,
}

/// Builds a validated `Network` from explicit parameters.
#[derive(Debug)]
pub struct Builder {
    weights: Vec<Array2<f64>>,
    biases: Vec<Array1<f64>>,
    activators: PerLayer<Activator>,
    learning_rate: LearningRate,
}

impl Builder {
    /// Sets the activation functions, either one for all layers or one per
    /// layer. Defaults to `Activator::Sigmoid` everywhere.
    pub fn activators<A>(mut self, activators: A) -> Self
        where A: Into<PerLayer<Activator>>
    {
        self.activators = activators.into();
        self
    }

    /// Sets the learning rate policy. Defaults to `1 / gradient_length`.
    pub fn learning_rate<L>(mut self, learning_rate: L) -> Self
        where L: Into<LearningRate>
    {
        self.learning_rate = learning_rate.into();
        self
    }

    /// Validates the topology and builds the network.
    pub fn build(self) -> Result<Network, ConfigError> {
        validate(&self.weights, &self.biases)?;
        let depth = self.weights.len();
        let activators = self.activators
            .resolve(depth)
            .map_err(|actual| {
                ConfigError::ActivatorCount {
                    expected: depth,
                    actual,
                }
            })?;
        Ok(Network {
            weights: Arc::new(self.weights),
            biases: Arc::new(self.biases),
            activators,
            learning_rate: self.learning_rate,
            data_used: 0,
        })
    }
}

/// The full result of feeding one input through the network.
#[derive(Clone, Debug, PartialEq)]
pub struct Trace {
    /// Pre-activation values for each layer.
    pub z: Vec<Array1<f64>>,
    /// Activations, starting with the flattened network input, so
    /// `a.len() == z.len() + 1`.
    pub a: Vec<Array1<f64>>,
}

impl Trace {
    /// The final activation vector.
    pub fn output(&self) -> &Array1<f64> {
        &self.a[self.a.len() - 1]
    }

    pub fn into_output(mut self) -> Array1<f64> {
        self.a.swap_remove(self.a.len() - 1)
    }
}

/// Cost gradients for every weight and bias of a network.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    pub weights: Vec<Array2<f64>>,
    pub biases: Vec<Array1<f64>>,
}

impl Gradient {
    fn zeros(network: &Network) -> Self {
        Gradient {
            weights: network.weights.iter().map(|w| Array2::zeros(w.dim())).collect(),
            biases: network.biases.iter().map(|b| Array1::zeros(b.len())).collect(),
        }
    }

    /// Euclidean norm over all weight and bias gradients together.
    pub fn length(&self) -> f64 {
        let weights: f64 = self.weights.iter().map(|w| w.iter().map(|g| g * g).sum::<f64>()).sum();
        let biases: f64 = self.biases.iter().map(|b| b.iter().map(|g| g * g).sum::<f64>()).sum();
        (weights + biases).sqrt()
    }

    fn accumulate(&mut self, other: &Gradient) {
        for (sum, g) in self.weights.iter_mut().zip(&other.weights) {
            *sum += g;
        }
        for (sum, g) in self.biases.iter_mut().zip(&other.biases) {
            *sum += g;
        }
    }

    fn divide(&mut self, n: f64) {
        for w in &mut self.weights {
            w.mapv_inplace(|g| g / n);
        }
        for b in &mut self.biases {
            b.mapv_inplace(|g| g / n);
        }
    }
}

impl Network {
    /// Starts building a network from per-layer weight matrices
    /// (`outputs × inputs`) and bias vectors (`outputs`).
    pub fn builder(weights: Vec<Array2<f64>>, biases: Vec<Array1<f64>>) -> Builder {
        Builder {
            weights,
            biases,
            activators: PerLayer::Shared(Activator::default()),
            learning_rate: LearningRate::default(),
        }
    }

    /// Creates a sigmoid network with the default learning rate.
    pub fn new(weights: Vec<Array2<f64>>,
               biases: Vec<Array1<f64>>)
               -> Result<Self, ConfigError> {
        Network::builder(weights, biases).build()
    }

    /// Starts building a network with random parameters.
    ///
    /// Arguments:
    ///  * `layer_sizes` - the number of neurons in each layer, input layer
    ///                    included.
    ///  * `weights` - distributions to draw each layer's weights from.
    ///  * `biases` - distributions to draw each layer's biases from.
    pub fn random<R>(layer_sizes: &[usize],
                     weights: &PerLayer<Distribution>,
                     biases: &PerLayer<Distribution>,
                     rng: &mut R)
                     -> Result<Builder, ConfigError>
        where R: Rng + ?Sized
    {
        let (w, b) = init::random_parameters(layer_sizes, weights, biases, rng)?;
        Ok(Network::builder(w, b))
    }

    /// Returns the number of layers, not counting the input.
    pub fn depth(&self) -> usize {
        self.weights.len()
    }

    /// Returns the size of the input layer to the network.
    pub fn input_len(&self) -> usize {
        self.weights[0].ncols()
    }

    /// Returns the size of the output layer from the network.
    pub fn output_len(&self) -> usize {
        self.weights[self.depth() - 1].nrows()
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    pub fn biases(&self) -> &Biases {
        &self.biases
    }

    pub fn activators(&self) -> &[Activator] {
        &self.activators
    }

    pub fn learning_rate(&self) -> &LearningRate {
        &self.learning_rate
    }

    /// Total number of examples this network has been trained on.
    pub fn data_used(&self) -> usize {
        self.data_used
    }

    /// Iterates over the layers from input to output.
    pub fn layers(&self)
                  -> impl DoubleEndedIterator<Item = Layer<'_>> + ExactSizeIterator {
        izip!(self.weights.iter(), self.biases.iter(), self.activators.iter())
            .map(|(weights, biases, &activator)| {
                Layer {
                    activator,
                    weights,
                    biases,
                }
            })
    }

    /// Feeds the provided `input` through the network, returning the output
    /// layer.
    ///
    /// Inputs of any dimension are flattened first. Every element must lie
    /// in `[0, 1]`.
    pub fn feed<S, D>(&self, input: &ArrayBase<S, D>) -> Result<Array1<f64>, DomainError>
        where S: Data<Elem = f64>,
              D: Dimension
    {
        self.forward(input).map(Trace::into_output)
    }

    /// Feeds the provided `input` through the network, returning the
    /// pre-activation and activated values for each layer.
    pub fn forward<S, D>(&self, input: &ArrayBase<S, D>) -> Result<Trace, DomainError>
        where S: Data<Elem = f64>,
              D: Dimension
    {
        let input: Array1<f64> = input.iter().cloned().collect();
        self.check_input(&input)?;

        let mut z = Vec::with_capacity(self.depth());
        let mut a = Vec::with_capacity(self.depth() + 1);
        a.push(input);
        for (i, layer) in self.layers().enumerate() {
            let (layer_z, layer_a) = layer.forward(a[i].view());
            z.push(layer_z);
            a.push(layer_a);
        }
        Ok(Trace { z, a })
    }

    /// Feeds the provided `expected` value back through the network,
    /// returning the gradient of the squared error cost.
    ///
    /// `trace` must have been produced by `forward` on this network.
    pub fn backward<S>(&self, trace: &Trace, expected: &ArrayBase<S, Ix1>) -> Gradient
        where S: Data<Elem = f64>
    {
        assert_eq!(trace.z.len(), self.depth());
        assert_eq!(trace.a.len(), self.depth() + 1);
        assert_eq!(expected.len(), self.output_len());

        let mut weights = Vec::with_capacity(self.depth());
        let mut biases = Vec::with_capacity(self.depth());
        let mut errors = (trace.output() - expected) * 2.0;
        for (i, layer) in self.layers().enumerate().rev() {
            let gradient = layer.backward(trace.a[i].view(), trace.z[i].view(), errors.view());
            weights.push(gradient.weights);
            biases.push(gradient.biases);
            errors = gradient.input_errors;
        }
        weights.reverse();
        biases.reverse();
        Gradient { weights, biases }
    }

    /// Trains the network on one batch of labelled data.
    ///
    /// Gradients are averaged over the batch and applied with the configured
    /// learning rate. When the mean gradient is exactly zero the parameters
    /// are left as they are. The batch is atomic: if any example is invalid
    /// an error is returned and the network is not changed.
    pub fn train(&mut self,
                 inputs: &[Array1<f64>],
                 expected: &[Array1<f64>])
                 -> Result<TrainMetric, TrainError> {
        if inputs.len() != expected.len() {
            return Err(TrainError::BatchMismatch {
                inputs: inputs.len(),
                expected: expected.len(),
            });
        }
        if inputs.is_empty() {
            return Err(TrainError::EmptyBatch);
        }

        let mut gradient = Gradient::zeros(self);
        let mut costs = Vec::with_capacity(inputs.len());
        let mut outputs = Vec::with_capacity(inputs.len());
        for (example, (x, y)) in inputs.iter().zip(expected).enumerate() {
            if y.len() != self.output_len() {
                return Err(TrainError::ExpectedLength {
                    example,
                    expected: self.output_len(),
                    actual: y.len(),
                });
            }
            let trace = self.forward(x)
                .map_err(|source| TrainError::Domain { example, source })?;
            gradient.accumulate(&self.backward(&trace, y));
            let output = trace.into_output();
            costs.push((&output - y).mapv(|d| d * d));
            outputs.push(output);
        }

        let n = inputs.len() as f64;
        gradient.divide(n);
        let cost = costs.iter().map(|c| c.sum()).sum::<f64>() / n;
        let gradient_len = gradient.length();

        let rate = if gradient_len != 0.0 {
            let rate = self.learning_rate.resolve(cost, gradient_len);
            self.apply(&gradient, rate);
            rate
        } else {
            warn!(data_used = self.data_used, cost, "zero gradient, skipping update");
            0.0
        };
        self.data_used += inputs.len();
        debug!(data_used = self.data_used, cost, gradient_len, rate, "trained batch");

        Ok(TrainMetric {
            data_used: self.data_used,
            w: Arc::clone(&self.weights),
            b: Arc::clone(&self.biases),
            w_gradient: gradient.weights,
            b_gradient: gradient.biases,
            gradient_len,
            learning_rate: rate,
            costs,
            cost,
            inputs: inputs.to_vec(),
            outputs,
            expected: expected.to_vec(),
        })
    }

    /// Returns a copy of this network with the parameters recorded in
    /// `metric`, as it was right after that training step.
    pub fn at_version(&self, metric: &TrainMetric) -> Result<Network, ConfigError> {
        validate(&metric.w, &metric.b)?;
        if metric.w.len() != self.depth() {
            return Err(ConfigError::ActivatorCount {
                expected: metric.w.len(),
                actual: self.activators.len(),
            });
        }
        Ok(Network {
            weights: Arc::clone(&metric.w),
            biases: Arc::clone(&metric.b),
            activators: self.activators.clone(),
            learning_rate: self.learning_rate.clone(),
            data_used: metric.data_used,
        })
    }

    /// Replaces the parameters with `param - rate * gradient`.
    fn apply(&mut self, gradient: &Gradient, rate: f64) {
        let weights = self.weights
            .iter()
            .zip(&gradient.weights)
            .map(|(w, g)| w - &(g * rate))
            .collect();
        let biases = self.biases
            .iter()
            .zip(&gradient.biases)
            .map(|(b, g)| b - &(g * rate))
            .collect();
        self.weights = Arc::new(weights);
        self.biases = Arc::new(biases);
    }

    fn check_input(&self, input: &Array1<f64>) -> Result<(), DomainError> {
        if input.len() != self.input_len() {
            return Err(DomainError::InputLength {
                expected: self.input_len(),
                actual: input.len(),
            });
        }
        match input.iter().enumerate().find(|&(_, &x)| !(0.0..=1.0).contains(&x)) {
            Some((index, &value)) => Err(DomainError::OutOfRange { index, value }),
            None => Ok(()),
        }
    }
}

/// Verifies that the provided parameters describe a network, returning an
/// error naming the first offending layer.
fn validate(weights: &[Array2<f64>], biases: &[Array1<f64>]) -> Result<(), ConfigError> {
    if weights.len() != biases.len() {
        return Err(ConfigError::DepthMismatch {
            weights: weights.len(),
            biases: biases.len(),
        });
    }
    if weights.is_empty() {
        return Err(ConfigError::EmptyNetwork);
    }
    for (layer, (w, b)) in weights.iter().zip(biases).enumerate() {
        if w.is_empty() {
            return Err(ConfigError::EmptyWeight { layer });
        }
        if b.is_empty() {
            return Err(ConfigError::EmptyBias { layer });
        }
        if w.nrows() != b.len() {
            return Err(ConfigError::BiasLength {
                layer,
                rows: w.nrows(),
                len: b.len(),
            });
        }
        if layer > 0 && weights[layer - 1].nrows() != w.ncols() {
            return Err(ConfigError::LayerMismatch {
                layer,
                outputs: weights[layer - 1].nrows(),
                inputs: w.ncols(),
            });
        }
    }
    Ok(())
}
