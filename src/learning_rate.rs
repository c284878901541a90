//! Learning rate policies for gradient descent.

use crate::error::ConfigError;

use std::fmt;
use std::sync::Arc;

type ScheduleFn = dyn Fn(f64, f64) -> f64 + Send + Sync;

/// How far to step along the negative gradient after each batch.
#[derive(Clone)]
pub enum LearningRate {
    /// The same rate for every batch.
    Constant(f64),
    /// A rate computed from the batch `(cost, gradient_length)`.
    Schedule(Arc<ScheduleFn>),
}

impl LearningRate {
    /// Wraps a closure of `(cost, gradient_length)` as a schedule.
    pub fn schedule<F>(f: F) -> Self
        where F: Fn(f64, f64) -> f64 + Send + Sync + 'static
    {
        LearningRate::Schedule(Arc::new(f))
    }

    /// Steps of unit length along the gradient: `1 / gradient_length`.
    pub fn inverse_gradient() -> Self {
        LearningRate::schedule(|_, gradient_len| inverse_gradient(gradient_len))
    }

    /// Picks a rate by comparing the batch cost against thresholds.
    ///
    /// Each step is `(cost_threshold, rate)`. The step with the largest
    /// threshold not above the cost applies; costs below every threshold use
    /// the lowest step. A `None` rate falls back to `1 / gradient_length`.
    pub fn cost_steps(mut steps: Vec<(f64, Option<f64>)>)
                      -> Result<Self, ConfigError> {
        if steps.is_empty() {
            return Err(ConfigError::InvalidLearningRate(
                "at least one cost step is required".into()));
        }
        for &(threshold, rate) in &steps {
            if !threshold.is_finite() {
                return Err(ConfigError::InvalidLearningRate(
                    format!("cost threshold {} is not finite", threshold)));
            }
            if let Some(rate) = rate {
                if !rate.is_finite() || rate < 0.0 {
                    return Err(ConfigError::InvalidLearningRate(
                        format!("rate {} must be finite and non-negative", rate)));
                }
            }
        }
        // Highest threshold first.
        steps.sort_by(|l, r| r.0.total_cmp(&l.0));
        Ok(LearningRate::schedule(move |cost, gradient_len| {
            let step = steps.iter()
                .find(|&&(threshold, _)| threshold <= cost)
                .or_else(|| steps.last());
            match step {
                Some(&(_, Some(rate))) => rate,
                _ => inverse_gradient(gradient_len),
            }
        }))
    }

    /// Resolves the rate for a batch. Always 0 when the gradient vanishes.
    pub fn resolve(&self, cost: f64, gradient_len: f64) -> f64 {
        if gradient_len == 0.0 {
            return 0.0;
        }
        match self {
            LearningRate::Constant(rate) => *rate,
            LearningRate::Schedule(f) => f(cost, gradient_len),
        }
    }
}

impl Default for LearningRate {
    fn default() -> Self {
        LearningRate::inverse_gradient()
    }
}

impl From<f64> for LearningRate {
    fn from(rate: f64) -> Self {
        LearningRate::Constant(rate)
    }
}

impl fmt::Debug for LearningRate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LearningRate::Constant(rate) => {
                f.debug_tuple("Constant").field(rate).finish()
            }
            LearningRate::Schedule(_) => f.write_str("Schedule(..)"),
        }
    }
}

fn inverse_gradient(gradient_len: f64) -> f64 {
    if gradient_len != 0.0 { 1.0 / gradient_len } else { 0.0 }
}
