//! Configuration errors.

use thiserror::Error;

/// Errors raised while building stations and networks.
///
/// All of them are detected before the first event is scheduled.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A rate, mean or other scale parameter was not strictly positive.
    #[error("{field} must be positive, got {value}")]
    NonPositive {
        /// Parameter name.
        field: &'static str,
        /// Offending value.
        value: f64,
    },

    /// A probability lies outside `[0, 1]`.
    #[error("{field} must be a probability in [0, 1], got {value}")]
    InvalidProbability {
        /// Parameter name.
        field: &'static str,
        /// Offending value.
        value: f64,
    },

    /// A station was configured without servers.
    #[error("station {station} needs at least one server")]
    ZeroCapacity {
        /// Station name.
        station: String,
    },

    /// Bounded-Pareto parameters outside `0 < k <= l < h`, `a > 0`.
    #[error("invalid bounded Pareto parameters a={a}, k={k}, l={l}, h={h}")]
    InvalidBoundedPareto {
        /// Shape.
        a: f64,
        /// Scale.
        k: f64,
        /// Lower bound.
        l: f64,
        /// Upper bound.
        h: f64,
    },

    /// No grid candidate of the bounded-Pareto fitter is valid for the domain.
    #[error("no bounded Pareto candidate is valid for domain [{low}, {high}]")]
    NoParetoCandidate {
        /// Lower bound of the normalized domain.
        low: f64,
        /// Upper bound of the normalized domain.
        high: f64,
    },

    /// A route or wiring refers to a station that does not exist.
    #[error("unknown station: {0}")]
    UnknownStation(String),

    /// Anything else that makes a configuration unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Check that `value` is strictly positive and finite.
    pub fn check_positive(field: &'static str, value: f64) -> Result<f64, ConfigError> {
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(ConfigError::NonPositive { field, value })
        }
    }

    /// Check that `value` lies in `[0, 1]`.
    pub fn check_probability(field: &'static str, value: f64) -> Result<f64, ConfigError> {
        if (0.0..=1.0).contains(&value) {
            Ok(value)
        } else {
            Err(ConfigError::InvalidProbability { field, value })
        }
    }
}
