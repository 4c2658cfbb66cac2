//! Test helpers for the queueing simulator.
//!
//! Small, fully wired networks and observers shared by integration tests
//! across crates.

use queuesim_core::Route;
use queuesim_rng::{ServiceSampler, StreamId};
use queuesim_simulation::{NetworkBuilder, RunObserver};
use queuesim_stations::{
    AnyStation, ArrivalConfig, ArrivalGenerator, ArrivalSchedule, PriorityEvaluationStation,
    PriorityStationConfig, ServiceStation, ServiceStationConfig, TerminalSink,
};
use queuesim_types::{ConfigError, Entity, PriorityClass, StationId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// Station ids of [`single_server_network`].
pub mod single_server {
    use queuesim_types::StationId;

    /// Arrival source.
    pub const SOURCE: StationId = StationId(0);
    /// The FIFO server.
    pub const DESK: StationId = StationId(1);
    /// Sink.
    pub const END: StationId = StationId(2);
}

/// Station ids of [`priority_mix_network`] and [`source_priority_network`].
pub mod priority_mix {
    use queuesim_types::StationId;

    /// Arrival source.
    pub const SOURCE: StationId = StationId(0);
    /// Splits arrivals between the direct and compiled paths.
    pub const SPLIT: StationId = StationId(1);
    /// Direct path.
    pub const DIRECT: StationId = StationId(2);
    /// Compiled path.
    pub const COMPILE: StationId = StationId(3);
    /// Priority evaluation station.
    pub const EVALUATION: StationId = StationId(4);
    /// Sink.
    pub const END: StationId = StationId(5);
}

/// Service time of the pass-through stations in [`priority_mix_network`].
const PASS_THROUGH_MEAN: f64 = 1e-6;

/// Heavy threshold of [`priority_mix_network`]: `ln(8/3)`.
const MIX_HEAVY_THRESHOLD: f64 = 0.980_829_253_011_726_2;

/// Heavy threshold no exponential demand reaches.
const NO_HEAVY_THRESHOLD: f64 = 1e12;

/// Source → single FIFO server → sink, with exponential arrivals and service.
pub fn single_server_network(
    arrival_rate: f64,
    service_rate: f64,
    arrivals: u64,
) -> Result<Vec<AnyStation>, ConfigError> {
    use single_server::*;

    let days = (arrivals as f64 / arrival_rate / 86_400.0).ceil() as u64 + 1;
    let mut builder = NetworkBuilder::new();
    builder.add("Start", |id| {
        let config =
            ArrivalConfig::new("Start", ArrivalSchedule::Constant { rate: arrival_rate, days }, DESK)
                .with_max_arrivals(arrivals);
        ArrivalGenerator::new(id, config)
    })?;
    builder.add("Desk", |id| {
        let config = ServiceStationConfig::new(
            "Desk",
            ServiceSampler::exponential_rate(service_rate)?,
            Route::to(END),
        )
        .with_stream(StreamId(1));
        ServiceStation::new(id, config)
    })?;
    builder.add("End", |id| Ok::<_, ConfigError>(TerminalSink::new(id, "End")))?;
    builder.build()
}

/// Source → split → {direct, compiled} → single-server priority station → sink.
///
/// A share `direct_share` of arrivals reaches evaluation through the direct
/// path; the rest are classified light or heavy by their exponential
/// demand. Evaluation has mean service 1, so `arrival_rate` is its load.
///
/// The heavy threshold is `ln(8/3)` times the mean, so `P(heavy) = 3/8` of
/// compiled arrivals. With `direct_share = 0.2` the mix is 20% direct,
/// 50% light and 30% heavy.
pub fn priority_mix_network(
    arrival_rate: f64,
    direct_share: f64,
    arrivals: u64,
) -> Result<Vec<AnyStation>, ConfigError> {
    priority_network(arrival_rate, direct_share, 1, MIX_HEAVY_THRESHOLD, arrivals)
}

/// The layout of [`priority_mix_network`] with `servers` evaluation servers
/// and no heavy class.
///
/// Classes depend only on the path taken, so evaluation is a two-class
/// non-preemptive priority M/M/c queue with mean service 1.
pub fn source_priority_network(
    arrival_rate: f64,
    direct_share: f64,
    servers: usize,
    arrivals: u64,
) -> Result<Vec<AnyStation>, ConfigError> {
    priority_network(arrival_rate, direct_share, servers, NO_HEAVY_THRESHOLD, arrivals)
}

fn priority_network(
    arrival_rate: f64,
    direct_share: f64,
    servers: usize,
    heavy_threshold: f64,
    arrivals: u64,
) -> Result<Vec<AnyStation>, ConfigError> {
    use priority_mix::*;

    fn pass_through(
        id: StationId,
        name: &str,
        stream: u8,
        route: Route,
    ) -> Result<ServiceStation, ConfigError> {
        let config = ServiceStationConfig::new(
            name,
            ServiceSampler::exponential(PASS_THROUGH_MEAN)?,
            route,
        )
        .with_servers(100_000)
        .with_stream(StreamId(stream));
        ServiceStation::new(id, config)
    }

    let mut builder = NetworkBuilder::new();
    builder.add("Start", |id| {
        let config = ArrivalConfig::new(
            "Start",
            ArrivalSchedule::Constant {
                rate: arrival_rate,
                days: 30,
            },
            SPLIT,
        )
        .with_max_arrivals(arrivals);
        ArrivalGenerator::new(id, config)
    })?;
    builder.add("Split", |id| {
        let route = Route::branch("direct share", direct_share, Route::to(DIRECT), Route::to(COMPILE))?;
        pass_through(id, "Split", 1, route)
    })?;
    builder.add("Direct", |id| pass_through(id, "Direct", 2, Route::to(EVALUATION)))?;
    builder.add("Compile", |id| pass_through(id, "Compile", 3, Route::to(EVALUATION)))?;
    builder.add("Evaluation", |id| {
        let config = PriorityStationConfig::new(
            "Evaluation",
            ServiceSampler::exponential(1.0)?,
            1.0,
            Route::to(END),
        )
        .with_servers(servers)
        .with_heavy_threshold(heavy_threshold)
        .with_direct_source(DIRECT)
        .with_stream(StreamId(5));
        PriorityEvaluationStation::new(id, config)
    })?;
    builder.add("End", |id| Ok::<_, ConfigError>(TerminalSink::new(id, "End")))?;
    builder.build()
}

/// Keeps every departed entity.
#[derive(Debug, Default)]
pub struct DepartureLog {
    /// Departed entities in departure order.
    pub entities: Vec<Entity>,
}

impl RunObserver for DepartureLog {
    fn on_departure(&mut self, entity: &Entity, _stations: &[AnyStation]) {
        self.entities.push(entity.clone());
    }
}

/// Running sums of queue time per station and per priority class.
#[derive(Debug, Default)]
pub struct WaitTotals {
    sums: BTreeMap<(StationId, Option<PriorityClass>), (f64, u64)>,
}

impl WaitTotals {
    /// Mean queue time at `station` over all classes.
    pub fn mean_wait(&self, station: StationId) -> Option<f64> {
        let (sum, count) = self
            .sums
            .iter()
            .filter(|((s, _), _)| *s == station)
            .fold((0.0, 0), |(sum, count), (_, (s, c))| (sum + s, count + c));
        (count > 0).then(|| sum / count as f64)
    }

    /// Mean queue time of one priority class at `station`.
    pub fn mean_wait_in(&self, station: StationId, class: PriorityClass) -> Option<f64> {
        let (sum, count) = self.sums.get(&(station, Some(class)))?;
        (*count > 0).then(|| sum / *count as f64)
    }

    /// Visits recorded for one priority class at `station`.
    pub fn visits_in(&self, station: StationId, class: PriorityClass) -> u64 {
        self.sums
            .get(&(station, Some(class)))
            .map_or(0, |(_, count)| *count)
    }
}

impl RunObserver for WaitTotals {
    fn on_departure(&mut self, entity: &Entity, _stations: &[AnyStation]) {
        for visit in &entity.visits {
            if let Some(wait) = visit.queue_time() {
                let slot = self
                    .sums
                    .entry((visit.station, visit.priority_class))
                    .or_default();
                slot.0 += wait.as_secs_f64();
                slot.1 += 1;
            }
        }
    }
}

/// `count` independent master seeds derived from `base`.
pub fn repetition_seeds(count: usize, base: u64) -> Vec<u64> {
    let mut rng = ChaCha8Rng::seed_from_u64(base);
    (0..count).map(|_| rng.gen_range(1..i32::MAX as u64)).collect()
}
