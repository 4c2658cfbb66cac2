//! Validation of simulated observations against theoretical values.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::adaptive::{select_batch_count, DEFAULT_BATCH_CANDIDATES};
use crate::batch::BatchMeansSample;
use crate::error::ValidationError;
use crate::interval::ConfidenceInterval;
use crate::theory::{TheoryTable, RESPONSE_TIME};

/// Observation sequences keyed by service then metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObservationSet {
    sequences: IndexMap<String, IndexMap<String, Vec<f64>>>,
}

impl ObservationSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one observation.
    pub fn push(&mut self, service: &str, metric: &str, value: f64) {
        self.sequence_mut(service, metric).push(value);
    }

    /// Appends many observations.
    pub fn extend(&mut self, service: &str, metric: &str, values: impl IntoIterator<Item = f64>) {
        self.sequence_mut(service, metric).extend(values);
    }

    fn sequence_mut(&mut self, service: &str, metric: &str) -> &mut Vec<f64> {
        self.sequences
            .entry(service.to_owned())
            .or_default()
            .entry(metric.to_owned())
            .or_default()
    }

    /// One sequence.
    pub fn get(&self, service: &str, metric: &str) -> Option<&[f64]> {
        self.sequences
            .get(service)?
            .get(metric)
            .map(Vec::as_slice)
    }

    /// All `(service, metric, values)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &[f64])> {
        self.sequences.iter().flat_map(|(service, metrics)| {
            metrics
                .iter()
                .map(move |(metric, v)| (service.as_str(), metric.as_str(), v.as_slice()))
        })
    }

    /// Caps every sequence at `limit` observations, keeping the earliest.
    pub fn truncate(&mut self, limit: usize) {
        for metrics in self.sequences.values_mut() {
            for values in metrics.values_mut() {
                values.truncate(limit);
            }
        }
    }

    /// Number of sequences.
    pub fn len(&self) -> usize {
        self.sequences.values().map(IndexMap::len).sum()
    }

    /// Whether the set holds no sequences.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One service/metric comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRow {
    pub service: String,
    pub metric: String,
    pub theoretical: f64,
    pub simulated_mean: f64,
    pub interval: ConfidenceInterval,
    pub half_width: f64,
    /// Lag-1 autocorrelation of the batch means.
    pub autocorr_lag1: f64,
    pub batches: usize,
    pub passed: bool,
}

/// Sum of per-service response times, simulated against theoretical.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TotalResponse {
    pub theoretical: f64,
    pub simulated: f64,
}

impl TotalResponse {
    /// Simulated over theoretical, minus one.
    pub fn relative_error(&self) -> f64 {
        if self.theoretical == 0.0 {
            return if self.simulated == 0.0 { 0.0 } else { f64::INFINITY };
        }
        self.simulated / self.theoretical - 1.0
    }
}

/// Outcome of a validation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub batch_count: usize,
    pub level: f64,
    pub rows: Vec<CheckRow>,
    pub total_response: Option<TotalResponse>,
}

impl ValidationReport {
    /// Number of passing rows.
    pub fn passed(&self) -> usize {
        self.rows.iter().filter(|r| r.passed).count()
    }

    /// Number of failing rows.
    pub fn failed(&self) -> usize {
        self.rows.len() - self.passed()
    }

    /// Whether every row passed.
    pub fn all_passed(&self) -> bool {
        self.rows.iter().all(|r| r.passed)
    }

    /// Finds a row.
    pub fn row(&self, service: &str, metric: &str) -> Option<&CheckRow> {
        self.rows
            .iter()
            .find(|r| r.service == service && r.metric == metric)
    }

    /// Print the comparison table.
    pub fn print_summary(&self) {
        println!("\n═══════════════════════════════════════════════════════════════════════════════");
        println!(
            "  VALIDATION (k = {}, {:.0}% confidence)",
            self.batch_count,
            self.level * 100.0
        );
        println!("═══════════════════════════════════════════════════════════════════════════════");
        println!(
            "{:<24} {:<14} {:>10} {:>10} {:>23} {:>8}  {}",
            "Service", "Metric", "Theory", "Sim", "Interval", "Lag-1", "OK"
        );
        for row in &self.rows {
            println!(
                "{:<24} {:<14} {:>10.4} {:>10.4} {:>23} {:>8.3}  {}",
                row.service,
                row.metric,
                row.theoretical,
                row.simulated_mean,
                row.interval.to_string(),
                row.autocorr_lag1,
                if row.passed { "yes" } else { "NO" }
            );
        }
        if let Some(total) = &self.total_response {
            println!();
            println!(
                "Total response time: theory {:.4}, simulated {:.4} ({:+.2}%)",
                total.theoretical,
                total.simulated,
                total.relative_error() * 100.0
            );
        }
        println!();
        println!("Passed: {}/{}", self.passed(), self.rows.len());
        println!("═══════════════════════════════════════════════════════════════════════════════\n");
    }
}

/// Batch-means validator.
#[derive(Debug, Clone, PartialEq)]
pub struct Validator {
    candidates: Vec<usize>,
    level: f64,
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            candidates: DEFAULT_BATCH_CANDIDATES.to_vec(),
            level: 0.95,
        }
    }
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Batch counts to choose between.
    pub fn with_candidates(mut self, candidates: Vec<usize>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Confidence level in `(0, 1)`.
    pub fn with_level(mut self, level: f64) -> Self {
        self.level = level;
        self
    }

    pub fn candidates(&self) -> &[usize] {
        &self.candidates
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    /// Compares every observed metric that has a theoretical value.
    ///
    /// The batch count is chosen jointly over all compared sequences. A row
    /// passes when its interval, built from at least two batches, brackets
    /// the theoretical value.
    pub fn validate(
        &self,
        observations: &ObservationSet,
        theory: &TheoryTable,
    ) -> Result<ValidationReport, ValidationError> {
        if !(self.level > 0.0 && self.level < 1.0) {
            return Err(ValidationError::InvalidParameter(format!(
                "confidence level {}",
                self.level
            )));
        }

        let pairs: Vec<(&str, &str, f64, &[f64])> = theory
            .iter()
            .filter_map(|(service, metric, value)| {
                let seq = observations.get(service, metric);
                if seq.is_none() {
                    warn!(service, metric, "No observations for theoretical value");
                }
                seq.map(|s| (service, metric, value, s))
            })
            .collect();
        if pairs.is_empty() {
            return Err(ValidationError::NoComparableMetrics);
        }

        let batch_count = select_batch_count(pairs.iter().map(|p| p.3), &self.candidates)?;

        let rows: Vec<CheckRow> = pairs
            .iter()
            .map(|&(service, metric, theoretical, values)| {
                let sample = BatchMeansSample::new(values, batch_count, self.level);
                CheckRow {
                    service: service.to_owned(),
                    metric: metric.to_owned(),
                    theoretical,
                    simulated_mean: sample.mean,
                    interval: sample.interval,
                    half_width: sample.interval.half_width,
                    autocorr_lag1: sample.autocorr_lag1,
                    batches: sample.effective_batches(),
                    passed: sample.brackets(theoretical),
                }
            })
            .collect();

        let response_rows: Vec<&CheckRow> =
            rows.iter().filter(|r| r.metric == RESPONSE_TIME).collect();
        let total_response = (!response_rows.is_empty()).then(|| TotalResponse {
            theoretical: response_rows.iter().map(|r| r.theoretical).sum(),
            simulated: response_rows.iter().map(|r| r.simulated_mean).sum(),
        });

        let report = ValidationReport {
            batch_count,
            level: self.level,
            rows,
            total_response,
        };
        info!(
            batch_count,
            rows = report.rows.len(),
            passed = report.passed(),
            "Validation complete"
        );
        Ok(report)
    }
}

/// Validates with the given candidate batch counts at 95% confidence.
pub fn validate(
    observations: &ObservationSet,
    theory: &TheoryTable,
    candidates: &[usize],
) -> Result<ValidationReport, ValidationError> {
    Validator::new()
        .with_candidates(candidates.to_vec())
        .validate(observations, theory)
}
