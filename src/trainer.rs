//! Utilities for training neural networks.
//!
//! A `Trainer` drives `Network::train` over a data set: it splits labelled
//! examples into chunks, trains one chunk at a time, and hands every
//! resulting `TrainMetric` to the caller.

use crate::error::{ConfigError, TrainError};
use crate::feed_forward::Network;
use crate::metric::TrainMetric;

use ndarray::{Array1, ArrayView1};
use std::time::{Duration, Instant};
use tracing::info;

/// A builder for training runs.
#[derive(Debug)]
pub struct Trainer {
    learning_mode: LearningMode,
    logging: Logging,
    stop_condition: StopCondition,
}

impl Default for Trainer {
    fn default() -> Self {
        Trainer::new()
    }
}

impl Trainer {
    /// Creates a new Trainer instance.
    ///
    /// The trainer is initialized with some default values. These defaults are:
    ///
    /// * A stochastic learning mode.
    /// * Stops after a single pass over the data.
    /// * Logs on training completion.
    pub fn new() -> Self {
        Trainer {
            learning_mode: LearningMode::Stochastic,
            logging: Logging::Completion,
            stop_condition: StopCondition::Epochs(1),
        }
    }

    /// Sets the `LearningMode` to use for training.
    pub fn learning_mode(mut self, mode: LearningMode) -> Self {
        self.learning_mode = mode;
        self
    }

    /// Sets the type of logging to be emitted during training.
    pub fn logging(mut self, logging: Logging) -> Self {
        self.logging = logging;
        self
    }

    /// Sets the condition to finish training.
    pub fn stop_condition<C>(mut self, condition: C) -> Self
        where C: Into<StopCondition>
    {
        self.stop_condition = condition.into();
        self
    }

    /// Trains `network` using the provided labelled data.
    ///
    /// The provided `examples` should be a list of labelled data, where each
    /// element takes the form `(network input, expected output)`. Every
    /// metric produced is passed to `sink` as soon as its chunk is trained.
    ///
    /// Returns:
    ///   A summary of the run, or the first error raised by a chunk. Chunks
    ///   trained before the error stay applied.
    pub fn train<I, O, F>(&self,
                          network: &mut Network,
                          examples: &[(I, O)],
                          mut sink: F)
                          -> Result<Summary, TrainError>
        where I: AsRef<[f64]>,
              O: AsRef<[f64]>,
              F: FnMut(TrainMetric)
    {
        let chunk_size = self.learning_mode.chunk_size()?;
        if examples.is_empty() {
            return Err(TrainError::EmptyBatch);
        }

        let start_time = Instant::now();
        let mut summary = Summary {
            chunks: 0,
            epochs: 0,
            data_used: network.data_used(),
            cost: None,
            elapsed: Duration::default(),
        };
        'training: loop {
            for chunk in examples.chunks(chunk_size) {
                let (inputs, expected) = split(chunk);
                let metric = network.train(&inputs, &expected)?;
                summary.chunks += 1;
                summary.data_used = metric.data_used;
                summary.cost = Some(metric.cost);
                self.logging.chunk(summary.chunks, &metric);
                sink(metric);
                if self.stop_condition.should_stop(&summary, start_time, false) {
                    break 'training;
                }
            }
            summary.epochs += 1;
            if self.stop_condition.should_stop(&summary, start_time, true) {
                break;
            }
        }
        summary.elapsed = start_time.elapsed();
        self.logging.completion(&summary);
        Ok(summary)
    }
}

fn split<I, O>(chunk: &[(I, O)]) -> (Vec<Array1<f64>>, Vec<Array1<f64>>)
    where I: AsRef<[f64]>,
          O: AsRef<[f64]>
{
    chunk.iter()
        .map(|(input, expected)| {
            (ArrayView1::from(input.as_ref()).to_owned(),
             ArrayView1::from(expected.as_ref()).to_owned())
        })
        .unzip()
}

/// The outcome of a training run.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    /// Number of chunks trained.
    pub chunks: usize,
    /// Number of complete passes over the data.
    pub epochs: usize,
    /// The network's data-used counter after the last chunk.
    pub data_used: usize,
    /// Cost of the last chunk trained.
    pub cost: Option<f64>,
    pub elapsed: Duration,
}

/// The learning mode to use for training
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LearningMode {
    /// Apply weight updates after every training example
    Stochastic,
    /// Apply weights updates in batches of the provided size
    ///
    /// The last batch of a pass may be smaller.
    Batch(usize),
}

impl LearningMode {
    fn chunk_size(&self) -> Result<usize, ConfigError> {
        match *self {
            LearningMode::Stochastic => Ok(1),
            LearningMode::Batch(0) => Err(ConfigError::InvalidChunkSize),
            LearningMode::Batch(size) => Ok(size),
        }
    }
}

/// Logging frequency to use during training
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Logging {
    /// No logs will be emitted
    Silent,
    /// A summary will be logged at completion
    Completion,
    /// Progress will be logged after every `n` chunks, and at completion
    Chunks(usize),
}

impl Logging {
    /// Performs logging after the `chunk`th chunk of training.
    fn chunk(&self, chunk: usize, metric: &TrainMetric) {
        if let Logging::Chunks(freq) = *self {
            if freq > 0 && chunk % freq == 0 {
                info!(chunk,
                      data_used = metric.data_used,
                      cost = metric.cost,
                      gradient_len = metric.gradient_len,
                      "training progress");
            }
        }
    }

    /// Performs logging at the end of training.
    fn completion(&self, summary: &Summary) {
        if let Logging::Silent = *self {
            return;
        }
        info!(chunks = summary.chunks,
              epochs = summary.epochs,
              data_used = summary.data_used,
              cost = ?summary.cost,
              elapsed = ?summary.elapsed,
              "training finished");
    }
}

/// When to stop training
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum StopCondition {
    /// Stops after the provided number of passes over the data
    Epochs(usize),
    /// Stops after the provided number of chunks
    Chunks(usize),
    /// Stops when the cost of a chunk drops below the provided threshold
    CostThreshold(f64),
    /// Stops after the provided duration
    Duration(Duration),
}

impl From<Duration> for StopCondition {
    fn from(duration: Duration) -> StopCondition {
        StopCondition::Duration(duration)
    }
}

impl StopCondition {
    /// Returns true if training is complete. `epoch_done` is set when a
    /// full pass over the data has just finished.
    fn should_stop(&self,
                   summary: &Summary,
                   start_time: Instant,
                   epoch_done: bool)
                   -> bool {
        match *self {
            StopCondition::Epochs(epochs) => {
                epoch_done && summary.epochs >= epochs
            }
            StopCondition::Chunks(chunks) => summary.chunks >= chunks,
            StopCondition::CostThreshold(threshold) => {
                summary.cost.map_or(false, |cost| cost < threshold)
            }
            StopCondition::Duration(duration) => {
                start_time.elapsed() >= duration
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::activator::Activator;
    use crate::error::DomainError;
    use ndarray::{Array1, Array2};

    fn network() -> Network {
        Network::builder(vec![Array2::from_elem((2, 2), 0.1)],
                         vec![Array1::zeros(2)])
            .activators(Activator::Sigmoid)
            .learning_rate(0.5)
            .build()
            .unwrap()
    }

    fn examples(n: usize) -> Vec<([f64; 2], [f64; 2])> {
        (0..n)
            .map(|i| {
                let x = i as f64 / n as f64;
                ([x, 1.0 - x], [1.0 - x, x])
            })
            .collect()
    }

    fn run(trainer: Trainer,
           network: &mut Network,
           examples: &[([f64; 2], [f64; 2])])
           -> (Result<Summary, TrainError>, Vec<usize>) {
        let mut seen = Vec::new();
        let result = trainer.train(network,
                                   examples,
                                   |metric| seen.push(metric.data_used));
        (result, seen)
    }

    #[test]
    fn stochastic_by_default() {
        let mut network = network();
        let (summary, seen) = run(Trainer::new(), &mut network, &examples(4));
        assert_eq!(seen, vec![1, 2, 3, 4]);
        let summary = summary.unwrap();
        assert_eq!(summary.chunks, 4);
        assert_eq!(summary.epochs, 1);
        assert_eq!(summary.data_used, 4);
    }

    #[test]
    fn last_partial_batch_is_trained() {
        let mut network = network();
        let trainer = Trainer::new().learning_mode(LearningMode::Batch(4));
        let (summary, seen) = run(trainer, &mut network, &examples(10));
        assert_eq!(seen, vec![4, 8, 10]);
        assert_eq!(summary.unwrap().chunks, 3);
        assert_eq!(network.data_used(), 10);
    }

    #[test]
    fn repeats_passes_until_epoch_limit() {
        let mut network = network();
        let trainer = Trainer::new()
            .learning_mode(LearningMode::Batch(3))
            .stop_condition(StopCondition::Epochs(3));
        let (summary, seen) = run(trainer, &mut network, &examples(6));
        assert_eq!(seen, vec![3, 6, 9, 12, 15, 18]);
        assert_eq!(summary.unwrap().epochs, 3);
    }

    #[test]
    fn chunk_limit_cuts_a_pass_short() {
        let mut network = network();
        let trainer = Trainer::new()
            .learning_mode(LearningMode::Batch(2))
            .stop_condition(StopCondition::Chunks(2));
        let (summary, seen) = run(trainer, &mut network, &examples(10));
        assert_eq!(seen, vec![2, 4]);
        let summary = summary.unwrap();
        assert_eq!(summary.chunks, 2);
        assert_eq!(summary.epochs, 0);
    }

    #[test]
    fn stops_below_cost_threshold() {
        let mut network = network();
        let trainer = Trainer::new()
            .stop_condition(StopCondition::CostThreshold(f64::INFINITY));
        let (summary, seen) = run(trainer, &mut network, &examples(5));
        assert_eq!(seen, vec![1]);
        assert!(summary.unwrap().cost.is_some());
    }

    #[test]
    fn stops_after_duration() {
        let mut network = network();
        let trainer = Trainer::new().stop_condition(Duration::from_secs(0));
        let (_, seen) = run(trainer, &mut network, &examples(5));
        assert_eq!(seen, vec![1]);
    }

    #[test]
    fn rejects_empty_batches() {
        let mut network = network();
        let trainer = Trainer::new().learning_mode(LearningMode::Batch(0));
        let (summary, seen) = run(trainer, &mut network, &examples(5));
        assert_eq!(summary.unwrap_err(),
                   TrainError::Config(ConfigError::InvalidChunkSize));
        assert!(seen.is_empty());

        let (summary, _) = run(Trainer::new(), &mut network, &[]);
        assert_eq!(summary.unwrap_err(), TrainError::EmptyBatch);
    }

    #[test]
    fn errors_abort_the_run() {
        let mut network = network();
        let mut data = examples(4);
        data[2].0 = [0.5, 3.0];
        let trainer = Trainer::new().learning_mode(LearningMode::Batch(2));
        let (summary, seen) = run(trainer, &mut network, &data);
        assert_eq!(summary.unwrap_err(),
                   TrainError::Domain {
                       example: 0,
                       source: DomainError::OutOfRange { index: 1, value: 3.0 },
                   });
        assert_eq!(seen, vec![2]);
        assert_eq!(network.data_used(), 2);
    }
}
