//! Hooks for recording a run.

use queuesim_stations::AnyStation;
use queuesim_types::Entity;
use std::time::Duration;

/// Receives entities as they leave the network.
///
/// Observers are how per-visit records leave the simulation; the runner
/// itself keeps no history once an entity departs.
pub trait RunObserver {
    /// Called once per entity reaching a sink, with its full visit history.
    fn on_departure(&mut self, entity: &Entity, stations: &[AnyStation]);

    /// Called when the run ends.
    fn on_finish(&mut self, _now: Duration, _stations: &[AnyStation]) {}
}

impl RunObserver for () {
    fn on_departure(&mut self, _entity: &Entity, _stations: &[AnyStation]) {}
}

impl<T: RunObserver + ?Sized> RunObserver for &mut T {
    fn on_departure(&mut self, entity: &Entity, stations: &[AnyStation]) {
        (**self).on_departure(entity, stations);
    }

    fn on_finish(&mut self, now: Duration, stations: &[AnyStation]) {
        (**self).on_finish(now, stations);
    }
}

impl<A: RunObserver, B: RunObserver> RunObserver for (A, B) {
    fn on_departure(&mut self, entity: &Entity, stations: &[AnyStation]) {
        self.0.on_departure(entity, stations);
        self.1.on_departure(entity, stations);
    }

    fn on_finish(&mut self, now: Duration, stations: &[AnyStation]) {
        self.0.on_finish(now, stations);
        self.1.on_finish(now, stations);
    }
}

impl<T: RunObserver> RunObserver for Vec<T> {
    fn on_departure(&mut self, entity: &Entity, stations: &[AnyStation]) {
        for observer in self.iter_mut() {
            observer.on_departure(entity, stations);
        }
    }

    fn on_finish(&mut self, now: Duration, stations: &[AnyStation]) {
        for observer in self.iter_mut() {
            observer.on_finish(now, stations);
        }
    }
}
