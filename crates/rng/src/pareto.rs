//! Bounded Pareto distribution and its Monte-Carlo parameter fitter.

use crate::Stream;
use queuesim_types::ConfigError;
use tracing::debug;

/// Bounded Pareto on `[l, h]` with shape `a` and scale `k`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundedPareto {
    a: f64,
    k: f64,
    l: f64,
    h: f64,
}

impl BoundedPareto {
    /// Create a distribution, requiring `0 < k <= l < h` and `a > 0`.
    pub fn new(a: f64, k: f64, l: f64, h: f64) -> Result<Self, ConfigError> {
        let valid = a.is_finite() && a > 0.0 && k > 0.0 && k <= l && l < h && h.is_finite();
        if valid {
            Ok(Self { a, k, l, h })
        } else {
            Err(ConfigError::InvalidBoundedPareto { a, k, l, h })
        }
    }

    /// Shape parameter.
    pub fn shape(&self) -> f64 {
        self.a
    }

    /// Scale parameter.
    pub fn scale(&self) -> f64 {
        self.k
    }

    /// Domain `(l, h)`.
    pub fn bounds(&self) -> (f64, f64) {
        (self.l, self.h)
    }

    /// Draw one sample.
    pub fn sample(&self, stream: &mut Stream<'_>) -> f64 {
        stream.bounded_pareto(self.a, self.k, self.l, self.h)
    }
}

/// A bounded Pareto fitted on the normalized domain, mapped back to the
/// original scale on every draw.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedPareto {
    normalized: BoundedPareto,
    low: f64,
    high: f64,
    target_mean: f64,
    fitted_mean: f64,
}

impl FittedPareto {
    /// The distribution on the normalized domain.
    pub fn normalized(&self) -> &BoundedPareto {
        &self.normalized
    }

    /// Original-scale domain.
    pub fn bounds(&self) -> (f64, f64) {
        (self.low, self.high)
    }

    /// Mean the fit aimed for, on the original scale.
    pub fn target_mean(&self) -> f64 {
        self.target_mean
    }

    /// Monte-Carlo mean of the chosen candidate, on the original scale.
    pub fn fitted_mean(&self) -> f64 {
        self.fitted_mean
    }

    /// Draw one sample on the original scale.
    pub fn sample(&self, stream: &mut Stream<'_>) -> f64 {
        let x = self.normalized.sample(stream);
        self.denormalize(x).clamp(self.low, self.high)
    }

    fn denormalize(&self, x: f64) -> f64 {
        let (nl, nh) = self.normalized.bounds();
        self.low + (self.high - self.low) * (x - nl) / (nh - nl)
    }
}

/// Grid search over `(a, k)` matching a target mean on a bounded domain.
#[derive(Debug, Clone)]
pub struct BoundedParetoFitter {
    /// Candidate shapes.
    pub shapes: Vec<f64>,
    /// Candidate scales. Values not below the normalized lower bound are skipped.
    pub scales: Vec<f64>,
    /// Monte-Carlo samples per candidate.
    pub samples: usize,
    /// Normalized domain lower bound.
    pub normalized_low: f64,
    /// Normalized domain upper bound.
    pub normalized_high: f64,
}

impl Default for BoundedParetoFitter {
    fn default() -> Self {
        Self {
            shapes: vec![1.2, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0],
            scales: vec![0.001, 0.005, 0.01, 0.02, 0.05],
            samples: 10_000,
            normalized_low: 0.1,
            normalized_high: 1.0,
        }
    }
}

impl BoundedParetoFitter {
    /// Set the candidate shapes.
    pub fn with_shapes(mut self, shapes: Vec<f64>) -> Self {
        self.shapes = shapes;
        self
    }

    /// Set the candidate scales.
    pub fn with_scales(mut self, scales: Vec<f64>) -> Self {
        self.scales = scales;
        self
    }

    /// Set the Monte-Carlo sample count per candidate.
    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples.max(1);
        self
    }

    /// Fit `(a, k)` so that samples denormalized to `[low, high]` average
    /// close to `target_mean`.
    ///
    /// Candidates are tried in grid order (shapes outer, scales inner) and
    /// only a strictly smaller error replaces the incumbent.
    pub fn fit(
        &self,
        target_mean: f64,
        low: f64,
        high: f64,
        stream: &mut Stream<'_>,
    ) -> Result<FittedPareto, ConfigError> {
        ConfigError::check_positive("bounded Pareto target mean", target_mean)?;
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(ConfigError::Invalid(format!(
                "bounded Pareto domain [{low}, {high}] is empty"
            )));
        }
        let (nl, nh) = (self.normalized_low, self.normalized_high);
        let target_normalized = nl + (nh - nl) * (target_mean - low) / (high - low);

        let mut best: Option<(BoundedPareto, f64, f64)> = None;
        for &a in &self.shapes {
            for &k in &self.scales {
                if k >= nl {
                    continue;
                }
                let Ok(candidate) = BoundedPareto::new(a, k, nl, nh) else {
                    continue;
                };
                let mean = (0..self.samples)
                    .map(|_| candidate.sample(stream))
                    .sum::<f64>()
                    / self.samples as f64;
                let error = (mean - target_normalized).abs();
                if best.as_ref().map_or(true, |(_, _, e)| error < *e) {
                    best = Some((candidate, mean, error));
                }
            }
        }

        let (normalized, mean, error) = best.ok_or(ConfigError::NoParetoCandidate {
            low: nl,
            high: nh,
        })?;
        let fitted_mean = low + (high - low) * (mean - nl) / (nh - nl);
        debug!(
            a = normalized.shape(),
            k = normalized.scale(),
            target_mean,
            fitted_mean,
            normalized_error = error,
            "Fitted bounded Pareto"
        );
        Ok(FittedPareto {
            normalized,
            low,
            high,
            target_mean,
            fitted_mean,
        })
    }
}
