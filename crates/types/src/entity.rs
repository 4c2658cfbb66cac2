//! Entities and their visit history.

use crate::{EntityId, StationId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Sub-queue of the priority evaluation station, highest priority first.
///
/// The derived ordering follows service priority: `Direct < Light < Heavy`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PriorityClass {
    /// Arrived from the direct-submission path ("Diretta").
    Direct,
    /// Service demand at most 1.5x the station mean ("Leggera").
    Light,
    /// Service demand above 1.5x the station mean ("Pesante").
    Heavy,
}

impl PriorityClass {
    /// All classes in service order.
    pub const ALL: [PriorityClass; 3] = [
        PriorityClass::Direct,
        PriorityClass::Light,
        PriorityClass::Heavy,
    ];

    /// Position in service order (0 is served first).
    pub fn rank(self) -> usize {
        self as usize
    }

    /// Lowercase label used in exported records.
    pub fn label(self) -> &'static str {
        match self {
            PriorityClass::Direct => "direct",
            PriorityClass::Light => "light",
            PriorityClass::Heavy => "heavy",
        }
    }
}

impl fmt::Display for PriorityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One entity's passage through one station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRecord {
    /// Station visited.
    pub station: StationId,
    /// When the entity joined the station's queue.
    pub enqueue_time: Duration,
    /// When a server picked the entity up.
    pub service_start_time: Option<Duration>,
    /// When service finished.
    pub service_end_time: Option<Duration>,
    /// Waiting entities ahead of this one at enqueue time.
    pub queue_length_at_entry: usize,
    /// Service duration drawn ahead of dispatch (priority station only).
    pub drawn_service_duration: Option<Duration>,
    /// Sub-queue assignment (priority station only).
    pub priority_class: Option<PriorityClass>,
}

impl VisitRecord {
    /// Create a record for an entity joining `station` at `enqueue_time`.
    pub fn new(station: StationId, enqueue_time: Duration, queue_length_at_entry: usize) -> Self {
        Self {
            station,
            enqueue_time,
            service_start_time: None,
            service_end_time: None,
            queue_length_at_entry,
            drawn_service_duration: None,
            priority_class: None,
        }
    }

    /// Time spent waiting for a server.
    pub fn queue_time(&self) -> Option<Duration> {
        self.service_start_time
            .map(|start| start.saturating_sub(self.enqueue_time))
    }

    /// Time spent in service.
    pub fn service_time(&self) -> Option<Duration> {
        match (self.service_start_time, self.service_end_time) {
            (Some(start), Some(end)) => Some(end.saturating_sub(start)),
            _ => None,
        }
    }

    /// Time from enqueue to the end of service.
    pub fn response_time(&self) -> Option<Duration> {
        self.service_end_time
            .map(|end| end.saturating_sub(self.enqueue_time))
    }

    /// Whether `enqueue <= start <= end` holds for the timestamps set so far.
    pub fn is_ordered(&self) -> bool {
        match (self.service_start_time, self.service_end_time) {
            (None, None) => true,
            (Some(start), None) => self.enqueue_time <= start,
            (Some(start), Some(end)) => self.enqueue_time <= start && start <= end,
            (None, Some(_)) => false,
        }
    }
}

/// A job traversing the network.
///
/// The visit list is append-only; the last record is the station the
/// entity currently occupies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Identity.
    pub id: EntityId,
    /// Station that created the entity.
    pub source: StationId,
    /// Arrival time into the network.
    pub arrived_at: Duration,
    /// Stations visited, in order.
    pub visits: Vec<VisitRecord>,
    /// Station whose full queue diverted the entity, if any.
    pub overflowed_at: Option<StationId>,
    /// Time the entity reached a terminal sink.
    pub departed_at: Option<Duration>,
}

impl Entity {
    /// Create a fresh entity with no visits.
    pub fn new(id: EntityId, source: StationId, arrived_at: Duration) -> Self {
        Self {
            id,
            source,
            arrived_at,
            visits: Vec::new(),
            overflowed_at: None,
            departed_at: None,
        }
    }

    /// Append a visit record.
    pub fn push_visit(&mut self, visit: VisitRecord) {
        self.visits.push(visit);
    }

    /// The most recent visit.
    pub fn last_visit(&self) -> Option<&VisitRecord> {
        self.visits.last()
    }

    /// The most recent visit, mutably.
    pub fn last_visit_mut(&mut self) -> Option<&mut VisitRecord> {
        self.visits.last_mut()
    }

    /// Station of the most recent visit.
    pub fn previous_station(&self) -> Option<StationId> {
        self.visits.last().map(|v| v.station)
    }

    /// End of the most recent completed service, or the arrival time.
    pub fn last_service_end(&self) -> Duration {
        self.visits
            .iter()
            .rev()
            .find_map(|v| v.service_end_time)
            .unwrap_or(self.arrived_at)
    }

    /// Time from arrival to departure.
    pub fn response_time(&self) -> Option<Duration> {
        self.departed_at
            .map(|end| end.saturating_sub(self.arrived_at))
    }

    /// Whether the entity was diverted by a full queue.
    pub fn overflowed(&self) -> bool {
        self.overflowed_at.is_some()
    }

    /// Check visit timestamps: each record is ordered, and no service starts
    /// before the previous service ended.
    pub fn is_causally_ordered(&self) -> bool {
        let mut previous_end = self.arrived_at;
        for visit in &self.visits {
            if !visit.is_ordered() || visit.enqueue_time < previous_end {
                return false;
            }
            if let Some(start) = visit.service_start_time {
                if start < previous_end {
                    return false;
                }
            }
            if let Some(end) = visit.service_end_time {
                previous_end = end;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visit(station: u32, enqueue: u64, start: u64, end: u64) -> VisitRecord {
        let mut v = VisitRecord::new(StationId(station), Duration::from_secs(enqueue), 0);
        v.service_start_time = Some(Duration::from_secs(start));
        v.service_end_time = Some(Duration::from_secs(end));
        v
    }

    #[test]
    fn test_priority_class_order() {
        assert!(PriorityClass::Direct < PriorityClass::Light);
        assert!(PriorityClass::Light < PriorityClass::Heavy);
        assert_eq!(PriorityClass::Heavy.rank(), 2);
    }

    #[test]
    fn test_visit_times() {
        let v = visit(1, 10, 12, 20);
        assert_eq!(v.queue_time(), Some(Duration::from_secs(2)));
        assert_eq!(v.service_time(), Some(Duration::from_secs(8)));
        assert_eq!(v.response_time(), Some(Duration::from_secs(10)));
        assert!(v.is_ordered());
    }

    #[test]
    fn test_unordered_visit_detected() {
        let v = visit(1, 10, 9, 20);
        assert!(!v.is_ordered());
    }

    #[test]
    fn test_causal_ordering() {
        let mut e = Entity::new(EntityId(1), StationId(0), Duration::from_secs(5));
        e.push_visit(visit(1, 5, 6, 10));
        e.push_visit(visit(2, 10, 15, 16));
        assert!(e.is_causally_ordered());
        assert_eq!(e.previous_station(), Some(StationId(2)));
        assert_eq!(e.last_service_end(), Duration::from_secs(16));

        // Second service starting before the first one ended.
        e.push_visit(visit(3, 12, 12, 13));
        assert!(!e.is_causally_ordered());
    }
}
