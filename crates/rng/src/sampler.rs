//! Service-time samplers.

use crate::{FittedPareto, Stream};
use queuesim_types::{secs, ConfigError};
use std::time::Duration;

/// Scale of the lognormal used for near-deterministic service.
const NEAR_DETERMINISTIC_SIGMA: f64 = 1e-4;

/// Service-time distribution of a station, in seconds.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceSampler {
    /// Exponential with the given mean.
    Exponential {
        /// Mean service time.
        mean: f64,
    },
    /// Erlang with `stages` phases and total mean `mean`.
    Erlang {
        /// Number of exponential phases.
        stages: u32,
        /// Mean of the whole service.
        mean: f64,
    },
    /// Uniform on `(low, high)`.
    Uniform {
        /// Lower bound.
        low: f64,
        /// Upper bound.
        high: f64,
    },
    /// `exp(Normal(a, b))`.
    Lognormal {
        /// Location.
        a: f64,
        /// Scale.
        b: f64,
    },
    /// Fitted bounded Pareto on an original-scale domain.
    BoundedPareto(FittedPareto),
}

impl ServiceSampler {
    /// Exponential service with the given mean.
    pub fn exponential(mean: f64) -> Result<Self, ConfigError> {
        let mean = ConfigError::check_positive("service mean", mean)?;
        Ok(ServiceSampler::Exponential { mean })
    }

    /// Exponential service with the given rate.
    pub fn exponential_rate(rate: f64) -> Result<Self, ConfigError> {
        let rate = ConfigError::check_positive("service rate", rate)?;
        Ok(ServiceSampler::Exponential { mean: 1.0 / rate })
    }

    /// Erlang service with `stages` phases and total mean `mean`.
    pub fn erlang(stages: u32, mean: f64) -> Result<Self, ConfigError> {
        ConfigError::check_positive("Erlang stages", stages as f64)?;
        let mean = ConfigError::check_positive("service mean", mean)?;
        Ok(ServiceSampler::Erlang { stages, mean })
    }

    /// Uniform service on `(low, high)`.
    pub fn uniform(low: f64, high: f64) -> Result<Self, ConfigError> {
        if !(low.is_finite() && high.is_finite() && 0.0 <= low && low < high) {
            return Err(ConfigError::Invalid(format!(
                "uniform service needs 0 <= low < high, got [{low}, {high}]"
            )));
        }
        Ok(ServiceSampler::Uniform { low, high })
    }

    /// Lognormal service matching a mean and variance.
    ///
    /// `b^2 = ln(1 + var / mean^2)` and `a = ln(mean) - b^2 / 2`.
    pub fn lognormal_from_moments(mean: f64, variance: f64) -> Result<Self, ConfigError> {
        let mean = ConfigError::check_positive("service mean", mean)?;
        if !(variance.is_finite() && variance >= 0.0) {
            return Err(ConfigError::NonPositive {
                field: "service variance",
                value: variance,
            });
        }
        let b2 = (1.0 + variance / (mean * mean)).ln();
        Ok(ServiceSampler::Lognormal {
            a: mean.ln() - 0.5 * b2,
            b: b2.sqrt(),
        })
    }

    /// Lognormal with a negligible spread around `mean`.
    pub fn near_deterministic(mean: f64) -> Result<Self, ConfigError> {
        let mean = ConfigError::check_positive("service mean", mean)?;
        let b = NEAR_DETERMINISTIC_SIGMA;
        Ok(ServiceSampler::Lognormal {
            a: mean.ln() - 0.5 * b * b,
            b,
        })
    }

    /// Analytic mean of the distribution; the fitted mean for bounded Pareto.
    pub fn mean(&self) -> f64 {
        match self {
            ServiceSampler::Exponential { mean } | ServiceSampler::Erlang { mean, .. } => *mean,
            ServiceSampler::Uniform { low, high } => 0.5 * (low + high),
            ServiceSampler::Lognormal { a, b } => (a + 0.5 * b * b).exp(),
            ServiceSampler::BoundedPareto(fitted) => fitted.fitted_mean(),
        }
    }

    /// Draw one service time in seconds.
    pub fn sample(&self, stream: &mut Stream<'_>) -> f64 {
        match self {
            ServiceSampler::Exponential { mean } => stream.exponential(*mean),
            ServiceSampler::Erlang { stages, mean } => {
                stream.erlang(*stages, *mean / *stages as f64)
            }
            ServiceSampler::Uniform { low, high } => stream.uniform(*low, *high),
            ServiceSampler::Lognormal { a, b } => stream.lognormal(*a, *b),
            ServiceSampler::BoundedPareto(fitted) => fitted.sample(stream),
        }
    }

    /// Draw one service time as a [`Duration`].
    pub fn sample_duration(&self, stream: &mut Stream<'_>) -> Duration {
        secs(self.sample(stream))
    }
}
