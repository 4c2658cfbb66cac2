//! Simulated-time helpers.
//!
//! Simulated time is a [`Duration`] offset from the start of the simulated
//! date range. Variate generators work in `f64` seconds, so conversions
//! happen at the boundary.

use std::time::Duration;

/// Seconds in one simulated day.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Zero-based index of the simulated day containing `t`.
pub fn day_index(t: Duration) -> u64 {
    t.as_secs() / SECONDS_PER_DAY
}

/// Convert seconds to a [`Duration`].
///
/// Negative and NaN inputs map to zero; values too large to represent map
/// to [`Duration::MAX`].
pub fn secs(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(Duration::MAX)
}

/// Convert a [`Duration`] to seconds.
pub fn secs_f64(d: Duration) -> f64 {
    d.as_secs_f64()
}
