//! Per-station counters.

use std::time::Duration;

/// Counters kept by every station.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StationStats {
    /// Entities accepted into the queue.
    pub arrivals: u64,
    /// Entities handed to a server.
    pub dispatched: u64,
    /// Services finished.
    pub completions: u64,
    /// Entities diverted because the queue was full.
    pub overflowed: u64,
    /// Sum of all service durations started here.
    pub busy_time: Duration,
    /// Longest waiting line observed.
    pub max_waiting: usize,
}

impl StationStats {
    /// Fraction of server capacity used over `elapsed`.
    pub fn utilization(&self, capacity: usize, elapsed: Duration) -> f64 {
        let available = capacity as f64 * elapsed.as_secs_f64();
        if available <= 0.0 {
            0.0
        } else {
            self.busy_time.as_secs_f64() / available
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utilization() {
        let stats = StationStats {
            busy_time: Duration::from_secs(80),
            ..Default::default()
        };
        assert!((stats.utilization(1, Duration::from_secs(100)) - 0.8).abs() < 1e-12);
        assert!((stats.utilization(2, Duration::from_secs(100)) - 0.4).abs() < 1e-12);
        assert_eq!(stats.utilization(1, Duration::ZERO), 0.0);
    }
}
