//! Closed-form queueing-theory reference values.
//!
//! These are the independent predictions the validator compares simulated
//! interval estimates against: M/M/1, M/M/c (Erlang-C), non-preemptive
//! priority M/M/c with a common service rate (Cobham), and the traffic
//! equations of an open Jackson network.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Metric name for mean time in queue.
pub const QUEUE_TIME: &str = "queue_time";
/// Metric name for mean time in service.
pub const SERVICE_TIME: &str = "service_time";
/// Metric name for mean time in the station.
pub const RESPONSE_TIME: &str = "response_time";

/// Steady-state metrics of a single queue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueueMetrics {
    /// Per-server utilization `λ / (c·μ)`.
    pub utilization: f64,
    /// Probability an arrival has to wait.
    pub wait_probability: f64,
    /// Mean number waiting.
    pub queue_length: f64,
    /// Mean time waiting.
    pub queue_time: f64,
    /// Mean service time `1/μ`.
    pub service_time: f64,
    /// Mean time in the station.
    pub response_time: f64,
}

fn check_rates(arrival_rate: f64, service_rate: f64, servers: u32) -> Result<(), ValidationError> {
    if !(arrival_rate >= 0.0) || !arrival_rate.is_finite() {
        return Err(ValidationError::InvalidParameter(format!(
            "arrival rate {arrival_rate}"
        )));
    }
    if !(service_rate > 0.0) || !service_rate.is_finite() {
        return Err(ValidationError::InvalidParameter(format!(
            "service rate {service_rate}"
        )));
    }
    if servers == 0 {
        return Err(ValidationError::InvalidParameter("zero servers".into()));
    }
    let rho = arrival_rate / (f64::from(servers) * service_rate);
    if rho >= 1.0 {
        return Err(ValidationError::Unstable(rho));
    }
    Ok(())
}

/// M/M/1 queue.
pub fn mm1(arrival_rate: f64, service_rate: f64) -> Result<QueueMetrics, ValidationError> {
    check_rates(arrival_rate, service_rate, 1)?;
    let rho = arrival_rate / service_rate;
    let queue_time = rho / (service_rate * (1.0 - rho));
    Ok(QueueMetrics {
        utilization: rho,
        wait_probability: rho,
        queue_length: rho * rho / (1.0 - rho),
        queue_time,
        service_time: 1.0 / service_rate,
        response_time: queue_time + 1.0 / service_rate,
    })
}

/// Erlang-C probability of waiting for offered load `a = λ/μ` on `c` servers.
///
/// Built from the Erlang-B recursion, which stays stable for large `c`.
pub fn erlang_c(offered_load: f64, servers: u32) -> f64 {
    let mut erlang_b = 1.0;
    for n in 1..=servers {
        let n = f64::from(n);
        erlang_b = offered_load * erlang_b / (n + offered_load * erlang_b);
    }
    let rho = offered_load / f64::from(servers);
    erlang_b / (1.0 - rho + rho * erlang_b)
}

/// M/M/c queue.
pub fn mmc(arrival_rate: f64, service_rate: f64, servers: u32) -> Result<QueueMetrics, ValidationError> {
    check_rates(arrival_rate, service_rate, servers)?;
    let c = f64::from(servers);
    let offered = arrival_rate / service_rate;
    let rho = offered / c;
    let wait_probability = erlang_c(offered, servers);
    let queue_time = wait_probability / (c * service_rate - arrival_rate);
    Ok(QueueMetrics {
        utilization: rho,
        wait_probability,
        queue_length: arrival_rate * queue_time,
        queue_time,
        service_time: 1.0 / service_rate,
        response_time: queue_time + 1.0 / service_rate,
    })
}

/// Mean queue time per class of a non-preemptive priority M/M/c queue in
/// which every class has service rate `μ`.
///
/// `class_rates` are ordered from highest to lowest priority. Uses Cobham's
/// formula `Wq_k = W0 / ((1 - σ_{k-1})(1 - σ_k))`, with
/// `W0 = C(c, a) / (c·μ)` and `σ_k` the cumulative load of classes `1..=k`.
pub fn priority_mmc_waits(
    class_rates: &[f64],
    service_rate: f64,
    servers: u32,
) -> Result<Vec<f64>, ValidationError> {
    let total: f64 = class_rates.iter().sum();
    check_rates(total, service_rate, servers)?;
    if class_rates.iter().any(|r| !(*r >= 0.0)) {
        return Err(ValidationError::InvalidParameter(
            "negative class arrival rate".into(),
        ));
    }
    let capacity = f64::from(servers) * service_rate;
    let w0 = erlang_c(total / service_rate, servers) / capacity;
    let mut sigma = 0.0;
    Ok(class_rates
        .iter()
        .map(|rate| {
            let before = sigma;
            sigma += rate / capacity;
            w0 / ((1.0 - before) * (1.0 - sigma))
        })
        .collect())
}

/// Solves the traffic equations `λ = γ + Pᵀλ` of an open network.
///
/// `external[i]` is the outside arrival rate into node `i` and
/// `routing[i][j]` the probability a job leaving `i` goes next to `j`.
pub fn solve_traffic(external: &[f64], routing: &[Vec<f64>]) -> Result<Vec<f64>, ValidationError> {
    let n = external.len();
    if routing.len() != n || routing.iter().any(|row| row.len() != n) {
        return Err(ValidationError::InvalidParameter(format!(
            "routing matrix must be {n}x{n}"
        )));
    }
    // Augmented matrix [I - Pᵀ | γ].
    let mut m: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            let mut row: Vec<f64> = (0..n)
                .map(|j| (if i == j { 1.0 } else { 0.0 }) - routing[j][i])
                .collect();
            row.push(external[i]);
            row
        })
        .collect();

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&a, &b| m[a][col].abs().total_cmp(&m[b][col].abs()))
            .ok_or(ValidationError::SingularTraffic)?;
        if m[pivot][col].abs() < 1e-12 {
            return Err(ValidationError::SingularTraffic);
        }
        m.swap(col, pivot);
        for row in col + 1..n {
            let factor = m[row][col] / m[col][col];
            if factor != 0.0 {
                for k in col..=n {
                    m[row][k] -= factor * m[col][k];
                }
            }
        }
    }

    let mut lambda = vec![0.0; n];
    for i in (0..n).rev() {
        let tail: f64 = (i + 1..n).map(|j| m[i][j] * lambda[j]).sum();
        lambda[i] = (m[i][n] - tail) / m[i][i];
    }
    Ok(lambda)
}

/// Theoretical values keyed by service then metric.
///
/// A `null` metric in JSON is kept as `None` and skipped by the validator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TheoryTable {
    entries: IndexMap<String, IndexMap<String, Option<f64>>>,
}

impl TheoryTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a table from JSON of the form `{"service": {"metric": value}}`.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json).map_err(|e| ValidationError::Parse(e.to_string()))
    }

    /// Serializes the table as pretty JSON.
    pub fn to_json(&self) -> Result<String, ValidationError> {
        serde_json::to_string_pretty(self).map_err(|e| ValidationError::Parse(e.to_string()))
    }

    /// Sets one value.
    pub fn insert(&mut self, service: impl Into<String>, metric: impl Into<String>, value: f64) {
        self.entries
            .entry(service.into())
            .or_default()
            .insert(metric.into(), Some(value));
    }

    /// Sets queue, service and response time from a solved queue.
    pub fn insert_queue(&mut self, service: impl Into<String>, metrics: &QueueMetrics) {
        let service = service.into();
        self.insert(service.clone(), QUEUE_TIME, metrics.queue_time);
        self.insert(service.clone(), SERVICE_TIME, metrics.service_time);
        self.insert(service, RESPONSE_TIME, metrics.response_time);
    }

    /// Looks up one value.
    pub fn get(&self, service: &str, metric: &str) -> Option<f64> {
        self.entries.get(service)?.get(metric).copied().flatten()
    }

    /// All `(service, metric, value)` triples with a value, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.entries.iter().flat_map(|(service, metrics)| {
            metrics
                .iter()
                .filter_map(move |(metric, v)| v.map(|v| (service.as_str(), metric.as_str(), v)))
        })
    }

    /// Service names in insertion order.
    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Whether the table holds no values.
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_mm1_textbook_values() {
        let q = mm1(0.8, 1.0).unwrap();
        assert!(close(q.utilization, 0.8));
        assert!(close(q.queue_time, 4.0));
        assert!(close(q.response_time, 5.0));
        assert!(close(q.queue_length, 3.2));
    }

    #[test]
    fn test_mmc_with_one_server_is_mm1() {
        let a = mm1(0.5, 1.0).unwrap();
        let b = mmc(0.5, 1.0, 1).unwrap();
        assert!(close(a.queue_time, b.queue_time));
        assert!(close(b.wait_probability, 0.5));
    }

    #[test]
    fn test_mmc_two_servers() {
        // a = 1.5, c = 2: C = 0.6428571..., Wq = C / (2 - 1.5).
        let q = mmc(1.5, 1.0, 2).unwrap();
        assert!((q.wait_probability - 9.0 / 14.0).abs() < 1e-12);
        assert!((q.queue_time - 9.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_unstable_queues_rejected() {
        assert_eq!(mm1(1.0, 1.0), Err(ValidationError::Unstable(1.0)));
        assert!(mmc(4.0, 1.0, 3).is_err());
        assert!(mm1(0.5, 0.0).is_err());
        assert!(mmc(0.5, 1.0, 0).is_err());
    }

    #[test]
    fn test_priority_waits_average_to_fcfs() {
        let rates = [0.2, 0.3, 0.4];
        let waits = priority_mmc_waits(&rates, 1.0, 1).unwrap();
        assert!(waits[0] < waits[1] && waits[1] < waits[2]);
        // Conservation: the rate-weighted mean wait equals the FCFS wait.
        let total: f64 = rates.iter().sum();
        let weighted: f64 = rates.iter().zip(&waits).map(|(r, w)| r * w).sum::<f64>() / total;
        let fcfs = mm1(total, 1.0).unwrap().queue_time;
        assert!((weighted - fcfs).abs() < 1e-9);
    }

    #[test]
    fn test_solve_traffic_with_feedback() {
        // 0 -> 1; 1 -> 0 with 0.25, else exits.
        let routing = vec![vec![0.0, 1.0], vec![0.25, 0.0]];
        let lambda = solve_traffic(&[1.0, 0.0], &routing).unwrap();
        assert!(close(lambda[0], 4.0 / 3.0));
        assert!(close(lambda[1], 4.0 / 3.0));
    }

    #[test]
    fn test_solve_traffic_rejects_closed_loop() {
        let routing = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        assert_eq!(
            solve_traffic(&[1.0, 0.0], &routing),
            Err(ValidationError::SingularTraffic)
        );
        assert!(solve_traffic(&[1.0], &routing).is_err());
    }

    #[test]
    fn test_theory_table_json() {
        let table = TheoryTable::from_json(
            r#"{"Desk": {"queue_time": 4.0, "service_time": null, "response_time": 5.0}}"#,
        )
        .unwrap();
        assert_eq!(table.get("Desk", QUEUE_TIME), Some(4.0));
        assert_eq!(table.get("Desk", SERVICE_TIME), None);
        assert_eq!(table.iter().count(), 2);
        let back = TheoryTable::from_json(&table.to_json().unwrap()).unwrap();
        assert_eq!(back, table);
        assert!(TheoryTable::from_json("[1, 2]").is_err());
    }
}
