//! Student-t confidence intervals.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::student::student_t_quantile;

/// Two-sided confidence interval for a mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    /// Point estimate.
    pub mean: f64,
    /// Half-width; infinite when fewer than two samples back the interval.
    pub half_width: f64,
    /// Confidence level, e.g. 0.95.
    pub level: f64,
}

impl ConfidenceInterval {
    /// Interval from a sample mean, unbiased variance and sample size.
    ///
    /// `half_width = t(n-1, (1+level)/2) * sqrt(variance / n)`.
    pub fn from_moments(mean: f64, variance: f64, n: usize, level: f64) -> Self {
        let half_width = if n < 2 {
            f64::INFINITY
        } else {
            let df = (n - 1) as f64;
            student_t_quantile(df, (1.0 + level) / 2.0) * (variance.max(0.0) / n as f64).sqrt()
        };
        Self {
            mean,
            half_width,
            level,
        }
    }

    /// Lower bound.
    pub fn low(&self) -> f64 {
        self.mean - self.half_width
    }

    /// Upper bound.
    pub fn high(&self) -> f64 {
        self.mean + self.half_width
    }

    /// Whether `value` lies inside the closed interval.
    pub fn contains(&self, value: f64) -> bool {
        self.low() <= value && value <= self.high()
    }

    /// Whether the half-width is finite.
    pub fn is_bounded(&self) -> bool {
        self.half_width.is_finite()
    }
}

impl fmt::Display for ConfidenceInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.4}, {:.4}]", self.low(), self.high())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_width_uses_t_quantile() {
        let ci = ConfidenceInterval::from_moments(10.0, 4.0, 64, 0.95);
        let expected = 1.9983 * (4.0f64 / 64.0).sqrt();
        assert!((ci.half_width - expected).abs() < 1e-3);
        assert!(ci.contains(10.4));
        assert!(!ci.contains(10.6));
    }

    #[test]
    fn test_single_sample_is_unbounded() {
        let ci = ConfidenceInterval::from_moments(1.0, 0.0, 1, 0.95);
        assert!(!ci.is_bounded());
        assert!(ci.contains(1e9));
    }

    #[test]
    fn test_zero_variance_collapses() {
        let ci = ConfidenceInterval::from_moments(2.0, 0.0, 10, 0.95);
        assert_eq!(ci.half_width, 0.0);
        assert!(ci.contains(2.0));
        assert!(!ci.contains(2.0001));
    }
}
