//! Application configuration.
//!
//! The configuration is read from a JSON file with three sections:
//!
//! ```json
//! {
//!   "ai": {
//!     "layers": [2, 5, 2],
//!     "activation_functions": ["ReLU", "Sigmoid"],
//!     "weight_distributions": {"Uniform": {"lb": -1.0, "rb": 1.0}},
//!     "bias_distributions": {"Gaussian": {"mean": 0.0, "sd": 0.5}},
//!     "learning_rate": [{"cost": 0.5, "rate": 1.0}, {"cost": 0.0, "rate": null}]
//!   },
//!   "train": {"chunk_size": 32, "chunk_count": 200},
//!   "processing": {"queue_max_size": 3, "queue_batch_size": 5}
//! }
//! ```
//!
//! Per-layer settings take either a single value or one value per layer.
//! `learning_rate` may be left out to use steps of unit length along the
//! gradient.

use crate::activator::{Activator, PerLayer};
use crate::error::{ConfigError, LoadError};
use crate::feed_forward::Network;
use crate::init::Distribution;
use crate::learning_rate::LearningRate;
use crate::trainer::{LearningMode, StopCondition, Trainer};

use rand::Rng;
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub ai: AiConfig,
    pub train: TrainConfig,
    pub processing: ProcessingConfig,
}

/// Network topology and initialization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    /// Neurons per layer, input layer included.
    pub layers: Vec<usize>,
    #[serde(default)]
    pub activation_functions: PerLayer<Activator>,
    pub weight_distributions: PerLayer<Distribution>,
    pub bias_distributions: PerLayer<Distribution>,
    #[serde(default)]
    pub learning_rate: Option<Vec<CostStep>>,
}

/// One band of a cost-keyed learning rate schedule.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostStep {
    /// Applies from this cost upwards.
    pub cost: f64,
    /// `None` selects `1 / gradient_length`.
    pub rate: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Examples per training batch.
    pub chunk_size: usize,
    /// Maximum number of batches; unlimited means one pass over the data.
    #[serde(default)]
    pub chunk_count: Option<usize>,
}

/// Hand-off of metrics from the training worker to their consumer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Capacity of the metrics channel, in batches.
    pub queue_max_size: usize,
    /// Metrics sent per batch.
    pub queue_batch_size: usize,
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig {
            layers: vec![2, 5, 5, 2],
            activation_functions: PerLayer::Shared(Activator::Sigmoid),
            weight_distributions: PerLayer::Shared(Distribution::Uniform {
                lb: -1.0,
                rb: 1.0,
            }),
            bias_distributions: PerLayer::Shared(Distribution::Gaussian {
                mean: 0.0,
                sd: 0.1,
            }),
            learning_rate: None,
        }
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            chunk_size: 10,
            chunk_count: None,
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        ProcessingConfig {
            queue_max_size: 3,
            queue_batch_size: 5,
        }
    }
}

impl AppConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let config: AppConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ai.validate()?;
        self.train.validate()?;
        self.processing.validate()
    }
}

impl AiConfig {
    /// Number of weight layers.
    pub fn depth(&self) -> usize {
        self.layers.len().saturating_sub(1)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layers.len() < 2 || self.layers.contains(&0) {
            return Err(ConfigError::LayerSizes(self.layers.clone()));
        }
        let depth = self.depth();
        self.activation_functions
            .resolve(depth)
            .map_err(|actual| {
                ConfigError::ActivatorCount {
                    expected: depth,
                    actual,
                }
            })?;
        for dists in &[&self.weight_distributions, &self.bias_distributions] {
            let dists = dists.resolve(depth).map_err(|actual| {
                ConfigError::DistributionCount {
                    expected: depth,
                    actual,
                }
            })?;
            for dist in &dists {
                dist.validate()?;
            }
        }
        self.learning_rate().map(|_| ())
    }

    /// The configured learning rate policy.
    pub fn learning_rate(&self) -> Result<LearningRate, ConfigError> {
        match self.learning_rate {
            Some(ref steps) => {
                LearningRate::cost_steps(steps.iter()
                    .map(|step| (step.cost, step.rate))
                    .collect())
            }
            None => Ok(LearningRate::default()),
        }
    }

    /// Builds a randomly initialized network.
    pub fn build_network<R>(&self, rng: &mut R) -> Result<Network, ConfigError>
        where R: Rng + ?Sized
    {
        Network::random(&self.layers,
                        &self.weight_distributions,
                        &self.bias_distributions,
                        rng)?
            .activators(self.activation_functions.clone())
            .learning_rate(self.learning_rate()?)
            .build()
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 || self.chunk_count == Some(0) {
            return Err(ConfigError::InvalidChunkSize);
        }
        Ok(())
    }

    /// A trainer that feeds `chunk_size` examples per batch for at most
    /// `chunk_count` batches.
    pub fn trainer(&self) -> Trainer {
        let trainer = Trainer::new().learning_mode(LearningMode::Batch(self.chunk_size));
        match self.chunk_count {
            Some(count) => trainer.stop_condition(StopCondition::Chunks(count)),
            None => trainer.stop_condition(StopCondition::Epochs(1)),
        }
    }
}

impl ProcessingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_max_size == 0 || self.queue_batch_size == 0 {
            return Err(ConfigError::InvalidQueue);
        }
        Ok(())
    }
}

/// Loads an application configuration from a JSON file.
///
/// Reads the file at `path`, deserializes it and validates every section.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, LoadError> {
    let contents = fs::read_to_string(path)?;
    AppConfig::from_json(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FULL: &str = r#"{
        "ai": {
            "layers": [2, 5, 2],
            "activation_functions": ["ReLU", "Sigmoid"],
            "weight_distributions": {"Uniform": {"lb": -1.0, "rb": 1.0}},
            "bias_distributions": [{"Gaussian": {"mean": 0.0, "sd": 0.5}}],
            "learning_rate": [{"cost": 0.5, "rate": 1.0}, {"cost": 0.0, "rate": null}]
        },
        "train": {"chunk_size": 32, "chunk_count": 200},
        "processing": {"queue_max_size": 3, "queue_batch_size": 5}
    }"#;

    #[test]
    fn parses_full_config() {
        let config = AppConfig::from_json(FULL).unwrap();
        assert_eq!(config.ai.layers, vec![2, 5, 2]);
        assert_eq!(config.ai.activation_functions,
                   PerLayer::Layers(vec![Activator::ReLU, Activator::Sigmoid]));
        assert_eq!(config.ai.weight_distributions,
                   PerLayer::Shared(Distribution::Uniform { lb: -1.0, rb: 1.0 }));
        assert_eq!(config.ai.learning_rate,
                   Some(vec![CostStep { cost: 0.5, rate: Some(1.0) },
                             CostStep { cost: 0.0, rate: None }]));
        assert_eq!(config.train.chunk_count, Some(200));
        assert_eq!(config.processing.queue_batch_size, 5);
    }

    #[test]
    fn optional_fields_default() {
        let config = AppConfig::from_json(r#"{
            "ai": {
                "layers": [3, 1],
                "weight_distributions": {"Uniform": {"lb": 0.0, "rb": 1.0}},
                "bias_distributions": {"Uniform": {"lb": 0.0, "rb": 1.0}}
            },
            "train": {"chunk_size": 1},
            "processing": {"queue_max_size": 1, "queue_batch_size": 1}
        }"#)
            .unwrap();
        assert_eq!(config.ai.activation_functions, PerLayer::Shared(Activator::Sigmoid));
        assert_eq!(config.ai.learning_rate, None);
        assert_eq!(config.train.chunk_count, None);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_invalid_sections() {
        let mut config = AppConfig::default();
        config.ai.layers = vec![2];
        assert_eq!(config.validate(), Err(ConfigError::LayerSizes(vec![2])));

        let mut config = AppConfig::default();
        config.ai.activation_functions = PerLayer::Layers(vec![Activator::ReLU; 2]);
        assert_eq!(config.validate(),
                   Err(ConfigError::ActivatorCount { expected: 3, actual: 2 }));

        let mut config = AppConfig::default();
        config.ai.bias_distributions =
            PerLayer::Shared(Distribution::Uniform { lb: 1.0, rb: 0.0 });
        assert!(matches!(config.validate(), Err(ConfigError::InvalidDistribution(_))));

        let mut config = AppConfig::default();
        config.ai.learning_rate = Some(vec![CostStep { cost: 0.0, rate: Some(-1.0) }]);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLearningRate(_))));

        let mut config = AppConfig::default();
        config.train.chunk_size = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidChunkSize));

        let mut config = AppConfig::default();
        config.processing.queue_max_size = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidQueue));
    }

    #[test]
    fn unknown_activator_is_a_parse_error() {
        let json = FULL.replace("\"ReLU\"", "\"Tanh\"");
        assert!(matches!(AppConfig::from_json(&json), Err(LoadError::Json(_))));
    }

    #[test]
    fn builds_configured_network() {
        let config = AppConfig::from_json(FULL).unwrap();
        let network = config.ai.build_network(&mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(network.depth(), 2);
        assert_eq!(network.input_len(), 2);
        assert_eq!(network.output_len(), 2);
        assert_eq!(network.activators(), &[Activator::ReLU, Activator::Sigmoid]);
        assert!(network.feed(&array![0.5, 0.5]).is_ok());

        let rate = network.learning_rate();
        assert_eq!(rate.resolve(0.7, 4.0), 1.0);
        assert_eq!(rate.resolve(0.3, 4.0), 0.25);
    }

    #[test]
    fn trainer_follows_chunking() {
        let config = TrainConfig {
            chunk_size: 2,
            chunk_count: Some(3),
        };
        let mut network = AiConfig {
            layers: vec![1, 1],
            ..AiConfig::default()
        }
            .build_network(&mut StdRng::seed_from_u64(1))
            .unwrap();
        let examples = vec![([0.5], [1.0]); 10];
        let mut seen = Vec::new();
        let summary = config.trainer()
            .train(&mut network, &examples, |m| seen.push(m.data_used))
            .unwrap();
        assert_eq!(seen, vec![2, 4, 6]);
        assert_eq!(summary.chunks, 3);
    }

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config, AppConfig::from_json(FULL).unwrap());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(dir.path().join("missing.json"));
        assert!(matches!(result, Err(LoadError::Io(_))));
    }
}
