//! Validation errors.

use thiserror::Error;

/// Errors from validation and theory calculations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// No candidate batch count fits every observation sequence.
    #[error("no batch count in {candidates:?} fits sequences of {shortest} observations")]
    NoFeasibleBatchCount {
        /// Candidates tried.
        candidates: Vec<usize>,
        /// Length of the shortest sequence.
        shortest: usize,
    },

    /// Observations and theory share no (service, metric) pair.
    #[error("no observed metric has a theoretical value")]
    NoComparableMetrics,

    /// A queue with load at or above one has no steady state.
    #[error("unstable queue: utilization {0} >= 1")]
    Unstable(f64),

    /// A rate or server count is not usable.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The traffic equations have no unique solution.
    #[error("traffic equations are singular")]
    SingularTraffic,

    /// The theory table could not be parsed.
    #[error("failed to parse theory table: {0}")]
    Parse(String),
}
