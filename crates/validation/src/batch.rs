//! Batch means reduction.

use serde::{Deserialize, Serialize};

use crate::autocorrelation::lag1_autocorrelation;
use crate::interval::ConfidenceInterval;

/// Splits `observations` into `k` contiguous equal-size batches and returns
/// each batch's mean.
///
/// The remainder `len % k` at the tail is discarded. Returns an empty vector
/// when `k` is zero or there are fewer than `k` observations.
pub fn batch_means(observations: &[f64], k: usize) -> Vec<f64> {
    if k == 0 {
        return Vec::new();
    }
    let size = observations.len() / k;
    if size == 0 {
        return Vec::new();
    }
    observations
        .chunks_exact(size)
        .take(k)
        .map(|batch| batch.iter().sum::<f64>() / size as f64)
        .collect()
}

/// A raw observation sequence reduced to `batch_count` batch means, with the
/// statistics derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchMeansSample {
    /// Requested number of batches.
    pub batch_count: usize,
    /// Number of raw observations.
    pub observations: usize,
    /// One mean per batch; shorter than `batch_count` only when empty.
    pub batch_means: Vec<f64>,
    /// Mean of the batch means, `0.0` when there are none.
    pub mean: f64,
    /// Bessel-corrected variance of the batch means, `0.0` below two batches.
    pub variance: f64,
    /// Lag-1 autocorrelation of the batch means, `0.0` when undefined.
    pub autocorr_lag1: f64,
    /// Student-t interval on the mean.
    pub interval: ConfidenceInterval,
}

impl BatchMeansSample {
    /// Reduces `raw_observations` with `batch_count` batches at `level` confidence.
    pub fn new(raw_observations: &[f64], batch_count: usize, level: f64) -> Self {
        let means = batch_means(raw_observations, batch_count);
        let k = means.len();
        let mean = if k == 0 {
            0.0
        } else {
            means.iter().sum::<f64>() / k as f64
        };
        let variance = if k < 2 {
            0.0
        } else {
            means.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (k - 1) as f64
        };
        Self {
            batch_count,
            observations: raw_observations.len(),
            autocorr_lag1: lag1_autocorrelation(&means),
            interval: ConfidenceInterval::from_moments(mean, variance, k, level),
            batch_means: means,
            mean,
            variance,
        }
    }

    /// Number of batches actually formed.
    pub fn effective_batches(&self) -> usize {
        self.batch_means.len()
    }

    /// Whether the interval brackets `value`. Always false below two batches.
    pub fn brackets(&self, value: f64) -> bool {
        self.effective_batches() >= 2 && self.interval.contains(value)
    }
}
