//! Deterministic simulation runner.
//!
//! One event is handled per turn: pop the earliest event, call the owning
//! station's `complete`, then carry out the returned actions. Forwards
//! are executed synchronously within the turn, depth first, so an
//! entity's hand-off to the next station happens at the same simulated
//! instant as its completion.

use crate::{EventScheduler, RunObserver};
use queuesim_core::{Action, EntityStore, Event, EventKind, SimulationError, Station, StepContext};
use queuesim_rng::RandomStreams;
use queuesim_stations::AnyStation;
use queuesim_types::StationId;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, info, trace};

/// Deterministic simulation runner.
///
/// Owns the station arena, the event queue, the entities in flight and the
/// random streams. Given the same stations and seed it produces identical
/// results every run.
pub struct SimulationRunner {
    /// All stations, indexed by StationId.
    stations: Vec<AnyStation>,

    /// Global event queue, ordered deterministically.
    scheduler: EventScheduler,

    /// Entities currently in the network.
    entities: EntityStore,

    /// Random streams shared by all stations through their stream ids.
    streams: RandomStreams,

    /// Current simulation time.
    now: Duration,

    /// Whether stations have scheduled their initial events.
    started: bool,

    /// Statistics.
    stats: SimulationStats,
}

/// Statistics collected during simulation.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SimulationStats {
    /// Total events processed.
    pub events_processed: u64,
    /// Arrival events processed.
    pub arrivals: u64,
    /// Completion events processed.
    pub completions: u64,
    /// Synchronous hand-offs between stations.
    pub forwards: u64,
    /// Entities that left the network.
    pub departures: u64,
    /// Of those, entities diverted by a full queue.
    pub overflowed: u64,
    /// Largest number of pending events seen.
    pub peak_pending_events: usize,
}

impl SimulationStats {
    /// Fraction of departures caused by queue overflow.
    pub fn overflow_rate(&self) -> f64 {
        if self.departures == 0 {
            0.0
        } else {
            self.overflowed as f64 / self.departures as f64
        }
    }
}

impl SimulationRunner {
    /// Create a runner over a built station arena, planting `seed`.
    pub fn new(stations: Vec<AnyStation>, seed: u64) -> Self {
        Self::with_streams(stations, RandomStreams::new(seed))
    }

    /// Create a runner continuing from existing stream states.
    pub fn with_streams(stations: Vec<AnyStation>, streams: RandomStreams) -> Self {
        info!(
            stations = stations.len(),
            stream0 = streams.seed(Default::default()),
            "Created simulation runner"
        );
        Self {
            stations,
            scheduler: EventScheduler::new(),
            entities: EntityStore::new(),
            streams,
            now: Duration::ZERO,
            started: false,
            stats: SimulationStats::default(),
        }
    }

    /// Get simulation statistics.
    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    /// Current simulation time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Get a station by id.
    pub fn station(&self, id: StationId) -> Option<&AnyStation> {
        self.stations.get(id.index())
    }

    /// All stations in arena order.
    pub fn stations(&self) -> &[AnyStation] {
        &self.stations
    }

    /// Find a station by name.
    pub fn station_by_name(&self, name: &str) -> Option<&AnyStation> {
        self.stations.iter().find(|s| s.name() == name)
    }

    /// Random stream states.
    pub fn streams(&self) -> &RandomStreams {
        &self.streams
    }

    /// Entities still in the network.
    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    /// Pending events.
    pub fn pending_events(&self) -> usize {
        self.scheduler.len()
    }

    /// Busy fraction of a station's servers since time zero.
    pub fn utilization(&self, id: StationId) -> Option<f64> {
        let station = self.station(id)?;
        Some(station.stats().utilization(station.capacity(), self.now))
    }

    /// Let every station schedule its initial events. Idempotent.
    pub fn initialize(&mut self) -> Result<(), SimulationError> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        for index in 0..self.stations.len() {
            let mut ctx = StepContext::new(self.now, &mut self.entities, &mut self.streams);
            let actions = self.stations[index].start(&mut ctx)?;
            self.process_actions(actions, &mut ())?;
        }
        debug!(pending = self.scheduler.len(), "Initial events scheduled");
        Ok(())
    }

    /// Run until the event queue is empty.
    ///
    /// Termination comes from sources refusing to schedule arrivals past
    /// their horizon. Any handler error aborts the run.
    pub fn run(&mut self, observer: &mut impl RunObserver) -> Result<(), SimulationError> {
        self.initialize()?;
        while self.step(observer)? {}
        observer.on_finish(self.now, &self.stations);
        info!(
            events = self.stats.events_processed,
            departures = self.stats.departures,
            overflowed = self.stats.overflowed,
            in_flight = self.entities.len(),
            final_time = ?self.now,
            "Simulation complete"
        );
        Ok(())
    }

    /// Run until no event remains at or before `end_time`.
    pub fn run_until(
        &mut self,
        end_time: Duration,
        observer: &mut impl RunObserver,
    ) -> Result<(), SimulationError> {
        self.initialize()?;
        while self
            .scheduler
            .peek_time()
            .is_some_and(|time| time <= end_time)
        {
            self.step(observer)?;
        }
        if self.now < end_time {
            self.now = end_time;
        }
        Ok(())
    }

    /// Process one event. Returns `false` when the queue is empty.
    pub fn step(&mut self, observer: &mut impl RunObserver) -> Result<bool, SimulationError> {
        let Some(event) = self.scheduler.pop() else {
            return Ok(false);
        };
        self.now = event.time;
        self.stats.events_processed += 1;
        match event.kind {
            EventKind::Arrival => self.stats.arrivals += 1,
            EventKind::Completion => self.stats.completions += 1,
        }
        trace!(
            time = ?self.now,
            station = %event.station,
            entity = %event.entity,
            kind = ?event.kind,
            "Processing event"
        );

        let station = self
            .stations
            .get_mut(event.station.index())
            .ok_or(SimulationError::UnknownStation(event.station))?;
        let mut ctx = StepContext::new(self.now, &mut self.entities, &mut self.streams);
        let actions = station.complete(event.entity, &mut ctx)?;
        debug_assert!(station.busy() <= station.capacity());

        self.process_actions(actions, observer)?;
        Ok(true)
    }

    /// Carry out actions depth first.
    fn process_actions(
        &mut self,
        actions: Vec<Action>,
        observer: &mut impl RunObserver,
    ) -> Result<(), SimulationError> {
        let mut pending: VecDeque<Action> = actions.into();
        while let Some(action) = pending.pop_front() {
            match action {
                Action::ScheduleCompletion { .. } | Action::ScheduleArrival { .. } => {
                    if let Some(event) = Event::from_action(&action) {
                        self.scheduler.push(event);
                        self.stats.peak_pending_events =
                            self.stats.peak_pending_events.max(self.scheduler.len());
                    }
                }
                Action::Forward { entity, to, at } => {
                    let station = self
                        .stations
                        .get_mut(to.index())
                        .ok_or(SimulationError::UnknownStation(to))?;
                    let mut ctx = StepContext::new(self.now, &mut self.entities, &mut self.streams);
                    let more = station.enqueue(entity, at, &mut ctx)?;
                    debug_assert!(station.busy() <= station.capacity());
                    self.stats.forwards += 1;
                    for next in more.into_iter().rev() {
                        pending.push_front(next);
                    }
                }
                Action::Depart { entity, .. } => {
                    let record = self.entities.remove(entity)?;
                    self.stats.departures += 1;
                    if record.overflowed() {
                        self.stats.overflowed += 1;
                    }
                    observer.on_departure(&record, &self.stations);
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for SimulationRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationRunner")
            .field("stations", &self.stations.len())
            .field("now", &self.now)
            .field("pending_events", &self.scheduler.len())
            .field("in_flight", &self.entities.len())
            .field("stats", &self.stats)
            .finish()
    }
}
