//! Per-batch training records.

use ndarray::{Array1, Array2};
use std::sync::Arc;

/// Weight matrices for every layer, shared between a network and the
/// metrics it has emitted.
pub type Weights = Arc<Vec<Array2<f64>>>;

/// Bias vectors for every layer, shared between a network and the metrics
/// it has emitted.
pub type Biases = Arc<Vec<Array1<f64>>>;

/// A snapshot of a single training step.
///
/// Metrics are created once per call to `Network::train` and never modified
/// afterwards. The network replaces its parameter arrays on every update
/// instead of writing into them, so `w` and `b` keep describing the network
/// as it was right after this step for as long as the metric is retained.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainMetric {
    /// Total number of examples the network has been trained on, including
    /// this batch. Strictly increasing between metrics of one network.
    pub data_used: usize,
    /// Weights after the update.
    pub w: Weights,
    /// Biases after the update.
    pub b: Biases,
    /// Mean weight gradient over the batch.
    pub w_gradient: Vec<Array2<f64>>,
    /// Mean bias gradient over the batch.
    pub b_gradient: Vec<Array1<f64>>,
    /// Euclidean norm of all gradients together.
    pub gradient_len: f64,
    /// The rate the gradient was scaled by; 0 when no update was applied.
    pub learning_rate: f64,
    /// Squared error per output, for every example.
    pub costs: Vec<Array1<f64>>,
    /// Mean over the batch of the summed squared errors.
    pub cost: f64,
    pub inputs: Vec<Array1<f64>>,
    pub outputs: Vec<Array1<f64>>,
    pub expected: Vec<Array1<f64>>,
}

impl TrainMetric {
    /// Number of examples in the batch that produced this metric.
    pub fn batch_len(&self) -> usize {
        self.inputs.len()
    }

    /// Whether the parameters were changed by this step.
    pub fn updated(&self) -> bool {
        self.gradient_len != 0.0
    }
}
