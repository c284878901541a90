//! Classification accuracy of a trained network.

use crate::error::TrainError;
use crate::feed_forward::Network;

use ndarray::ArrayView1;

/// Counts of a classification test run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub tested: usize,
    pub errors: usize,
}

impl Evaluation {
    /// Fraction of correctly classified examples, if anything was tested.
    pub fn accuracy(&self) -> Option<f64> {
        if self.tested == 0 {
            None
        } else {
            Some((self.tested - self.errors) as f64 / self.tested as f64)
        }
    }

    /// Records one prediction.
    pub fn record(&mut self, correct: bool) {
        self.tested += 1;
        if !correct {
            self.errors += 1;
        }
    }
}

/// Index of the largest element, the first one on ties.
pub fn argmax(values: ArrayView1<f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if b >= v => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Feeds every example through `network` and compares the most activated
/// output against the most activated expected value.
pub fn evaluate<I, O>(network: &Network, examples: &[(I, O)]) -> Result<Evaluation, TrainError>
    where I: AsRef<[f64]>,
          O: AsRef<[f64]>
{
    let mut evaluation = Evaluation::default();
    for (example, (input, expected)) in examples.iter().enumerate() {
        let output = network.feed(&ArrayView1::from(input.as_ref()))
            .map_err(|source| TrainError::Domain { example, source })?;
        let guess = argmax(output.view());
        evaluation.record(guess.is_some() && guess == argmax(ArrayView1::from(expected.as_ref())));
    }
    Ok(evaluation)
}
