//! Error types.

use std::io;

/// A malformed network topology or training setting.
///
/// Raised while building a network or loading a configuration, never during
/// training.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("network must have at least one layer")]
    EmptyNetwork,
    #[error("got {weights} weight matrices but {biases} bias vectors")]
    DepthMismatch { weights: usize, biases: usize },
    #[error("weight matrix must not be empty (layer={layer})")]
    EmptyWeight { layer: usize },
    #[error("bias vector must not be empty (layer={layer})")]
    EmptyBias { layer: usize },
    #[error("weight has {rows} rows but bias has length {len} (layer={layer})")]
    BiasLength { layer: usize, rows: usize, len: usize },
    #[error("layer {layer} expects {inputs} inputs but the previous layer has {outputs} outputs")]
    LayerMismatch {
        layer: usize,
        outputs: usize,
        inputs: usize,
    },
    #[error("expected 1 or {expected} activators, got {actual}")]
    ActivatorCount { expected: usize, actual: usize },
    #[error("expected 1 or {expected} distributions, got {actual}")]
    DistributionCount { expected: usize, actual: usize },
    #[error("invalid distribution: {0}")]
    InvalidDistribution(String),
    #[error("layer sizes must name at least two non-empty layers, got {0:?}")]
    LayerSizes(Vec<usize>),
    #[error("chunk size must be positive")]
    InvalidChunkSize,
    #[error("queue sizes must be positive")]
    InvalidQueue,
    #[error("unknown activation function '{0}', must be one of: Sigmoid, ReLU")]
    UnknownActivator(String),
    #[error("invalid learning rate: {0}")]
    InvalidLearningRate(String),
}

/// A network input outside of the `[0, 1]` domain.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("all elements must have value in range [0, 1], got {value} at index {index}")]
    OutOfRange { index: usize, value: f64 },
    #[error("network expects {expected} inputs, got {actual}")]
    InputLength { expected: usize, actual: usize },
}

/// A rejected training batch. No parameters are touched when this is
/// returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrainError {
    #[error("training batch is empty")]
    EmptyBatch,
    #[error("got {inputs} inputs but {expected} expected outputs")]
    BatchMismatch { inputs: usize, expected: usize },
    #[error("example {example}: network has {expected} outputs, expected vector has {actual}")]
    ExpectedLength {
        example: usize,
        expected: usize,
        actual: usize,
    },
    #[error("example {example}: {source}")]
    Domain {
        example: usize,
        #[source]
        source: DomainError,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HistoryError {
    #[error("data used must be strictly increasing: last={last}, got={got}")]
    OutOfOrder { last: usize, got: usize },
}

/// Failure to read an application configuration file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}
