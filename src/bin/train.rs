extern crate neurons_trainer;
extern crate rand;
extern crate rand_distr;

use neurons_trainer::config::{load_config, AppConfig};
use neurons_trainer::evaluate::evaluate;
use neurons_trainer::feed_forward::{Network, TrainMetric};
use neurons_trainer::history::MetricHistory;
use neurons_trainer::trainer::Logging;

use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};
use std::error::Error;
use std::sync::mpsc::{self, Receiver, SendError, SyncSender};
use std::thread;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

type Input = [f64; 2];
type Output = [f64; 2];

/// Points on a noisy unit circle, labelled by whether they fall in the
/// first/third or second/fourth quadrant. Coordinates are mapped from
/// `[-1.5, 1.5]` onto the network's `[0, 1]` input domain.
fn generate_data<R: Rng>(num_samples: usize,
                         rng: &mut R)
                         -> Result<Vec<(Input, Output)>, Box<dyn Error>> {
    let radians = Uniform::new(0.0, 2.0 * std::f64::consts::PI);
    let noise = Normal::new(0.0, 0.1)?;
    let normalize = |x: f64| ((x + 1.5) / 3.0).max(0.0).min(1.0);

    let mut data = Vec::with_capacity(num_samples);
    for _ in 0..num_samples {
        let theta = radians.sample(rng);
        let x = theta.cos() + noise.sample(rng);
        let y = theta.sin() + noise.sample(rng);
        let class = if x * y > 0.0 { [1.0, 0.0] } else { [0.0, 1.0] };
        data.push(([normalize(x), normalize(y)], class));
    }
    Ok(data)
}

/// Groups metrics into fixed-size batches before sending them.
///
/// The bounded channel holds at most `queue_max_size` batches, so a slow
/// consumer stalls training rather than buffering without limit.
struct BatchSender {
    sender: SyncSender<Vec<TrainMetric>>,
    batch: Vec<TrainMetric>,
    batch_size: usize,
}

impl BatchSender {
    fn new(max_size: usize, batch_size: usize) -> (BatchSender, Receiver<Vec<TrainMetric>>) {
        let (sender, receiver) = mpsc::sync_channel(max_size);
        let sender = BatchSender {
            sender,
            batch: Vec::with_capacity(batch_size),
            batch_size,
        };
        (sender, receiver)
    }

    fn push(&mut self, metric: TrainMetric) -> Result<(), SendError<Vec<TrainMetric>>> {
        self.batch.push(metric);
        if self.batch.len() >= self.batch_size {
            let batch = std::mem::replace(&mut self.batch, Vec::with_capacity(self.batch_size));
            self.sender.send(batch)?;
        }
        Ok(())
    }

    /// Sends any incomplete batch. Dropping the sender then closes the channel.
    fn finish(mut self) -> Result<(), SendError<Vec<TrainMetric>>> {
        if !self.batch.is_empty() {
            let batch = std::mem::take(&mut self.batch);
            self.sender.send(batch)?;
        }
        Ok(())
    }
}

fn score(set_name: &str,
         network: &Network,
         data: &[(Input, Output)])
         -> Result<(), Box<dyn Error>> {
    let evaluation = evaluate(network, data)?;
    info!(set = set_name,
          tested = evaluation.tested,
          errors = evaluation.errors,
          accuracy = ?evaluation.accuracy(),
          "evaluation");
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    config.validate()?;
    info!(layers = ?config.ai.layers,
          chunk_size = config.train.chunk_size,
          chunk_count = ?config.train.chunk_count,
          "starting training");

    let mut rng = rand::thread_rng();
    let training_data = generate_data(10_000, &mut rng)?;
    let test_data = generate_data(1_000, &mut rng)?;

    let mut network = config.ai.build_network(&mut rng)?;
    let trainer = config.train.trainer().logging(Logging::Chunks(100));
    let (mut sender, receiver) = BatchSender::new(config.processing.queue_max_size,
                                                  config.processing.queue_batch_size);

    let worker = thread::spawn(move || {
        let mut connected = true;
        let summary = trainer.train(&mut network, &training_data, |metric| {
            if connected && sender.push(metric).is_err() {
                debug!("metric receiver hung up");
                connected = false;
            }
        });
        if connected && sender.finish().is_err() {
            debug!("metric receiver hung up");
        }
        summary.map(|summary| (network, summary, training_data))
    });

    let mut history = MetricHistory::new();
    for batch in receiver {
        history.extend(batch)?;
        if let Some(latest) = history.latest() {
            debug!(versions = history.len(),
                   data_used = latest.data_used,
                   cost = latest.cost,
                   "received metrics");
        }
    }

    let (network, summary, training_data) = worker.join()
        .map_err(|_| "training thread panicked")??;
    info!(versions = history.len(),
          chunks = summary.chunks,
          data_used = summary.data_used,
          "training complete");

    let latest = history.latest().ok_or("no training metrics were recorded")?;
    let restored = network.at_version(latest)?;
    score("Training", &restored, &training_data)?;
    score("Test", &restored, &test_data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;

    fn metric(network: &mut Network) -> TrainMetric {
        network.train(&[array![0.5]], &[array![1.0]]).unwrap()
    }

    #[test]
    fn generated_data_is_normalized() {
        let data = generate_data(200, &mut rand::thread_rng()).unwrap();
        assert_eq!(data.len(), 200);
        for (input, output) in &data {
            assert!(input.iter().all(|&x| (0.0..=1.0).contains(&x)));
            assert_eq!(output[0] + output[1], 1.0);
        }
    }

    #[test]
    fn batches_metrics_and_flushes_remainder() {
        let mut network = Network::new(vec![array![[0.1]]], vec![array![0.0]]).unwrap();
        let (mut sender, receiver) = BatchSender::new(4, 2);
        for _ in 0..5 {
            sender.push(metric(&mut network)).unwrap();
        }
        sender.finish().unwrap();

        let batches: Vec<Vec<usize>> = receiver.iter()
            .map(|batch| batch.iter().map(|m| m.data_used).collect())
            .collect();
        assert_eq!(batches, vec![vec![1, 2], vec![3, 4], vec![5]]);
    }

    #[test]
    fn push_fails_once_receiver_is_gone() {
        let mut network = Network::new(vec![array![[0.1]]], vec![array![0.0]]).unwrap();
        let (mut sender, receiver) = BatchSender::new(1, 1);
        drop(receiver);
        assert!(sender.push(metric(&mut network)).is_err());
    }
}
