//! Version history of training metrics, keyed by data used.

use crate::error::HistoryError;
use crate::metric::TrainMetric;

use std::slice;

/// How to match a data-used value against recorded versions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Approx {
    /// Only an exact match.
    Eq,
    /// The latest version at or before the value.
    Le,
    /// The earliest version at or after the value.
    Ge,
}

/// An append-only list of metrics ordered by strictly increasing data used.
#[derive(Clone, Debug, Default)]
pub struct MetricHistory {
    metrics: Vec<TrainMetric>,
}

impl MetricHistory {
    pub fn new() -> Self {
        MetricHistory::default()
    }

    /// Records a metric. Its data used must be greater than that of every
    /// metric already recorded.
    pub fn push(&mut self, metric: TrainMetric) -> Result<(), HistoryError> {
        if let Some(last) = self.metrics.last() {
            if metric.data_used <= last.data_used {
                return Err(HistoryError::OutOfOrder {
                    last: last.data_used,
                    got: metric.data_used,
                });
            }
        }
        self.metrics.push(metric);
        Ok(())
    }

    /// Records every metric in order, stopping at the first out of order.
    pub fn extend<I>(&mut self, metrics: I) -> Result<(), HistoryError>
        where I: IntoIterator<Item = TrainMetric>
    {
        for metric in metrics {
            self.push(metric)?;
        }
        Ok(())
    }

    /// Finds the index of the version matching `data_used`.
    pub fn find(&self, data_used: usize, approx: Approx) -> Option<usize> {
        // Number of versions with data_used strictly below the target.
        let below = self.metrics.partition_point(|m| m.data_used < data_used);
        let exact = self.metrics
            .get(below)
            .map_or(false, |m| m.data_used == data_used);
        match approx {
            Approx::Eq => if exact { Some(below) } else { None },
            Approx::Le => if exact { Some(below) } else { below.checked_sub(1) },
            Approx::Ge => if below < self.metrics.len() { Some(below) } else { None },
        }
    }

    /// Returns the metric matching `data_used`, see `find`.
    pub fn version(&self, data_used: usize, approx: Approx) -> Option<&TrainMetric> {
        self.find(data_used, approx).map(|i| &self.metrics[i])
    }

    pub fn get(&self, index: usize) -> Option<&TrainMetric> {
        self.metrics.get(index)
    }

    pub fn latest(&self) -> Option<&TrainMetric> {
        self.metrics.last()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<TrainMetric> {
        self.metrics.iter()
    }

    /// The `(data_used, cost)` series over all versions.
    pub fn costs(&self) -> Vec<(usize, f64)> {
        self.metrics.iter().map(|m| (m.data_used, m.cost)).collect()
    }
}

impl<'a> IntoIterator for &'a MetricHistory {
    type Item = &'a TrainMetric;
    type IntoIter = slice::Iter<'a, TrainMetric>;

    fn into_iter(self) -> Self::IntoIter {
        self.metrics.iter()
    }
}
