//! Inverse-transform variate generators.
//!
//! Parameters are not validated here; [`crate::ServiceSampler`] and
//! [`crate::BoundedPareto`] check them once at construction.

use crate::Stream;
use std::f64::consts::PI;

impl Stream<'_> {
    /// Uniform on `(a, b)`.
    pub fn uniform(&mut self, a: f64, b: f64) -> f64 {
        a + (b - a) * self.random()
    }

    /// Bernoulli trial: `true` when the uniform draw is at most `p`.
    pub fn bernoulli(&mut self, p: f64) -> bool {
        self.random() <= p
    }

    /// Exponential with the given mean.
    pub fn exponential(&mut self, mean: f64) -> f64 {
        -mean * (1.0 - self.random()).ln()
    }

    /// Erlang: the sum of `stages` exponentials, each with mean `stage_mean`.
    pub fn erlang(&mut self, stages: u32, stage_mean: f64) -> f64 {
        (0..stages).map(|_| self.exponential(stage_mean)).sum()
    }

    /// Normal via the Box-Muller transform. Consumes two draws.
    pub fn normal(&mut self, mu: f64, sigma: f64) -> f64 {
        let u1 = self.random();
        let u2 = self.random();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
        mu + sigma * z
    }

    /// Lognormal: `exp(Normal(a, b))`.
    pub fn lognormal(&mut self, a: f64, b: f64) -> f64 {
        self.normal(a, b).exp()
    }

    /// Bounded Pareto on `[l, h]` with shape `a` and scale `k`.
    ///
    /// The uniform draw is rescaled into `[F(l), F(h)]` of the unbounded
    /// Pareto CDF `F(x) = 1 - (k/x)^a` and inverted.
    pub fn bounded_pareto(&mut self, a: f64, k: f64, l: f64, h: f64) -> f64 {
        let f_low = 1.0 - (k / l).powf(a);
        let f_high = 1.0 - (k / h).powf(a);
        let u = self.random();
        let scaled = f_low + u * (f_high - f_low);
        let x = k / (1.0 - scaled).powf(1.0 / a);
        x.clamp(l, h)
    }
}
