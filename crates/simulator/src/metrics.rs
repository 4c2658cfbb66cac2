//! Run metrics and the end-of-run report.

use hdrhistogram::{CreationError, Histogram};
use indexmap::IndexMap;
use queuesim_core::Station;
use queuesim_simulation::{RunObserver, SimulationStats};
use queuesim_stations::{AnyStation, StationKind};
use queuesim_types::Entity;
use serde::Serialize;
use std::time::Duration;

/// Significant figures kept by every histogram.
const SIGNIFICANT_FIGURES: u8 = 3;

/// Records response times (end to end) and per-station waits, in
/// milliseconds of simulated time.
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    warm_up: Duration,
    response: Histogram<u64>,
    waits: IndexMap<String, Histogram<u64>>,
    stations: Vec<StationSummary>,
    simulated: Duration,
}

/// End-of-run figures for one queueing station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSummary {
    pub name: String,
    pub servers: usize,
    pub arrivals: u64,
    pub completions: u64,
    pub overflowed: u64,
    pub max_waiting: usize,
    pub utilization: f64,
    /// Mean wait in seconds, over recorded visits.
    pub mean_wait: f64,
}

impl MetricsCollector {
    pub fn new() -> Result<Self, CreationError> {
        Ok(Self {
            warm_up: Duration::ZERO,
            response: Histogram::new(SIGNIFICANT_FIGURES)?,
            waits: IndexMap::new(),
            stations: Vec::new(),
            simulated: Duration::ZERO,
        })
    }

    /// Skip entities that arrived before `warm_up`.
    pub fn with_warm_up(mut self, warm_up: Duration) -> Self {
        self.warm_up = warm_up;
        self
    }

    /// Response time quantile in seconds.
    pub fn response_quantile(&self, quantile: f64) -> f64 {
        millis_to_secs(self.response.value_at_quantile(quantile))
    }

    /// Mean wait at `station` in seconds.
    pub fn mean_wait(&self, station: &str) -> Option<f64> {
        self.waits
            .get(station)
            .filter(|h| !h.is_empty())
            .map(|h| h.mean() / 1000.0)
    }

    /// Number of response times recorded.
    pub fn recorded(&self) -> u64 {
        self.response.len()
    }

    /// Build the report from the runner's counters.
    pub fn report(&self, stats: &SimulationStats, wall_duration: Duration) -> SimulationReport {
        let measured = !self.response.is_empty();
        let value = |q: f64| if measured { self.response_quantile(q) } else { 0.0 };
        SimulationReport {
            wall_duration,
            simulated_duration: self.simulated,
            arrivals: stats.arrivals,
            departures: stats.departures,
            overflowed: stats.overflowed,
            events_processed: stats.events_processed,
            response_mean: if measured { self.response.mean() / 1000.0 } else { 0.0 },
            response_p50: value(0.50),
            response_p90: value(0.90),
            response_p99: value(0.99),
            response_max: if measured { millis_to_secs(self.response.max()) } else { 0.0 },
            stations: self.stations.clone(),
        }
    }
}

impl RunObserver for MetricsCollector {
    fn on_departure(&mut self, entity: &Entity, stations: &[AnyStation]) {
        if entity.arrived_at < self.warm_up {
            return;
        }
        if let Some(response) = entity.response_time() {
            self.response.saturating_record(millis(response));
        }
        for visit in &entity.visits {
            let (Some(wait), Some(station)) =
                (visit.queue_time(), stations.get(visit.station.index()))
            else {
                continue;
            };
            if !self.waits.contains_key(station.name()) {
                let fresh = Histogram::new_from(&self.response);
                self.waits.insert(station.name().to_string(), fresh);
            }
            if let Some(histogram) = self.waits.get_mut(station.name()) {
                histogram.saturating_record(millis(wait));
            }
        }
    }

    fn on_finish(&mut self, now: Duration, stations: &[AnyStation]) {
        self.simulated = now;
        self.stations = stations
            .iter()
            .filter(|s| matches!(s.kind(), StationKind::Service | StationKind::Priority))
            .map(|station| {
                let stats = station.stats();
                StationSummary {
                    name: station.name().to_string(),
                    servers: station.capacity(),
                    arrivals: stats.arrivals,
                    completions: stats.completions,
                    overflowed: stats.overflowed,
                    max_waiting: stats.max_waiting,
                    utilization: stats.utilization(station.capacity(), now),
                    mean_wait: self.mean_wait(station.name()).unwrap_or(0.0),
                }
            })
            .collect();
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn millis_to_secs(ms: u64) -> f64 {
    ms as f64 / 1000.0
}

/// Final simulation report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub wall_duration: Duration,
    pub simulated_duration: Duration,
    pub arrivals: u64,
    pub departures: u64,
    pub overflowed: u64,
    pub events_processed: u64,
    /// Response time figures, in seconds.
    pub response_mean: f64,
    pub response_p50: f64,
    pub response_p90: f64,
    pub response_p99: f64,
    pub response_max: f64,
    pub stations: Vec<StationSummary>,
}

impl SimulationReport {
    pub fn print_summary(&self) {
        println!("\n═══════════════════════════════════════════");
        println!("          QUEUE SIMULATION REPORT           ");
        println!("═══════════════════════════════════════════");
        println!();
        println!("Entities:");
        println!("  Arrived:     {}", self.arrivals);
        println!("  Departed:    {}", self.departures);
        println!("  Queue full:  {}", self.overflowed);
        println!();
        println!("Response time (departed):");
        println!("  P50:  {:.1}s", self.response_p50);
        println!("  P90:  {:.1}s", self.response_p90);
        println!("  P99:  {:.1}s", self.response_p99);
        println!("  Max:  {:.1}s", self.response_max);
        println!("  Avg:  {:.1}s", self.response_mean);
        println!();
        println!("Stations:");
        for s in &self.stations {
            println!(
                "  {:<18} servers {:>4}  util {:>6.2}%  wait {:>10.1}s  full {}",
                s.name,
                s.servers,
                s.utilization * 100.0,
                s.mean_wait,
                s.overflowed
            );
        }
        println!();
        println!(
            "Duration: {:.2}s (simulated: {:.2} days, {} events)",
            self.wall_duration.as_secs_f64(),
            self.simulated_duration.as_secs_f64() / 86_400.0,
            self.events_processed
        );
        println!("═══════════════════════════════════════════\n");
    }
}
