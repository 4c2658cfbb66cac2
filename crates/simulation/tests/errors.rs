//! Handler failures abort the run.

use queuesim_core::{Route, SimulationError, Station};
use queuesim_rng::{ServiceSampler, StreamId};
use queuesim_simulation::{RunObserver, SimulationRunner};
use queuesim_stations::{
    AnyStation, ArrivalConfig, ArrivalGenerator, ArrivalSchedule, ServiceStation,
    ServiceStationConfig,
};
use queuesim_types::{Entity, StationId};
use std::time::Duration;

/// Station 9 is not in the arena.
const MISSING: StationId = StationId(9);

/// Source → Desk → a station that does not exist. Built by hand, since the
/// network builder rejects unknown route targets.
fn dangling_network() -> Vec<AnyStation> {
    let source = ArrivalGenerator::new(
        StationId(0),
        ArrivalConfig::new("Start", ArrivalSchedule::Constant { rate: 1.0, days: 1 }, StationId(1))
            .with_max_arrivals(100),
    )
    .unwrap();
    let desk = ServiceStation::new(
        StationId(1),
        ServiceStationConfig::new("Desk", ServiceSampler::exponential(1.0).unwrap(), Route::to(MISSING))
            .with_stream(StreamId(1)),
    )
    .unwrap();
    vec![source.into(), desk.into()]
}

#[derive(Default)]
struct Finished {
    departures: usize,
    finished: bool,
}

impl RunObserver for Finished {
    fn on_departure(&mut self, _entity: &Entity, _stations: &[AnyStation]) {
        self.departures += 1;
    }

    fn on_finish(&mut self, _now: Duration, _stations: &[AnyStation]) {
        self.finished = true;
    }
}

#[test]
fn test_forward_to_unknown_station_aborts_run() {
    let mut runner = SimulationRunner::new(dangling_network(), 77);
    let mut observer = Finished::default();

    let result = runner.run(&mut observer);
    assert_eq!(result, Err(SimulationError::UnknownStation(MISSING)));

    // The run stopped at the first completion, with work still queued.
    let stats = runner.stats().clone();
    assert_eq!(stats.completions, 1);
    assert_eq!(stats.departures, 0);
    assert_eq!(stats.events_processed, stats.arrivals + 1);
    assert!(stats.arrivals < 100);
    assert!(runner.pending_events() > 0);
    assert_eq!(observer.departures, 0);
    assert!(!observer.finished);
}

#[test]
fn test_error_surfaces_after_manual_steps() {
    let mut runner = SimulationRunner::new(dangling_network(), 78);
    runner.initialize().unwrap();
    // First event is the first arrival; it reaches the idle desk.
    assert!(runner.step(&mut ()).unwrap());
    let desk = runner.station(StationId(1)).unwrap();
    assert_eq!(desk.busy(), 1);

    let result = runner.run(&mut ());
    assert!(matches!(result, Err(SimulationError::UnknownStation(id)) if id == MISSING));
}
