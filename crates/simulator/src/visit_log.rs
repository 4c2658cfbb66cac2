//! Per-visit observation sequences.

use queuesim_core::Station;
use queuesim_simulation::RunObserver;
use queuesim_stations::AnyStation;
use queuesim_types::{secs_f64, Entity};
use queuesim_validation::theory::{QUEUE_TIME, RESPONSE_TIME, SERVICE_TIME};
use queuesim_validation::ObservationSet;
use std::time::Duration;

/// Collects queue, service and response times of every completed visit,
/// in departure order.
///
/// Visits to the priority station are also recorded under
/// `"<station>/<class>"`.
#[derive(Debug, Clone, Default)]
pub struct VisitLog {
    warm_up: Duration,
    observations: ObservationSet,
    skipped: u64,
}

impl VisitLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip entities that arrived before `warm_up`.
    pub fn with_warm_up(mut self, warm_up: Duration) -> Self {
        self.warm_up = warm_up;
        self
    }

    pub fn observations(&self) -> &ObservationSet {
        &self.observations
    }

    pub fn into_observations(self) -> ObservationSet {
        self.observations
    }

    /// Entities skipped by the warm-up.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl RunObserver for VisitLog {
    fn on_departure(&mut self, entity: &Entity, stations: &[AnyStation]) {
        if entity.arrived_at < self.warm_up {
            self.skipped += 1;
            return;
        }
        for visit in &entity.visits {
            let (Some(queue), Some(service)) = (visit.queue_time(), visit.service_time()) else {
                continue;
            };
            let Some(station) = stations.get(visit.station.index()) else {
                continue;
            };
            let (queue, service) = (secs_f64(queue), secs_f64(service));
            let mut keys = vec![station.name().to_string()];
            if let Some(class) = visit.priority_class {
                keys.push(format!("{}/{}", station.name(), class.label()));
            }
            for key in &keys {
                self.observations.push(key, QUEUE_TIME, queue);
                self.observations.push(key, SERVICE_TIME, service);
                self.observations.push(key, RESPONSE_TIME, queue + service);
            }
        }
    }
}
