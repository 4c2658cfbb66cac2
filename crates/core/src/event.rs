//! Scheduled events.

use crate::Action;
use queuesim_types::{EntityId, StationId};
use std::time::Duration;

/// What an event means to the station that handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A source releases a new entity into the network.
    Arrival,
    /// A server finishes with an entity.
    Completion,
}

/// An event in the scheduler queue. Immutable once scheduled; fires once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// Firing time.
    pub time: Duration,
    /// Station whose `complete` handler runs.
    pub station: StationId,
    /// Entity the event concerns.
    pub entity: EntityId,
    /// Event kind.
    pub kind: EventKind,
}

impl Event {
    /// Build the event for a scheduling action, if it is one.
    pub fn from_action(action: &Action) -> Option<Self> {
        match *action {
            Action::ScheduleCompletion {
                station,
                entity,
                at,
            } => Some(Event {
                time: at,
                station,
                entity,
                kind: EventKind::Completion,
            }),
            Action::ScheduleArrival {
                station,
                entity,
                at,
            } => Some(Event {
                time: at,
                station,
                entity,
                kind: EventKind::Arrival,
            }),
            Action::Forward { .. } | Action::Depart { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_from_scheduling_action() {
        let action = Action::ScheduleCompletion {
            station: StationId(2),
            entity: EntityId(9),
            at: Duration::from_secs(4),
        };
        let event = Event::from_action(&action).unwrap();
        assert_eq!(event.kind, EventKind::Completion);
        assert_eq!(event.station, StationId(2));
        assert_eq!(event.time, Duration::from_secs(4));
        assert!(action.is_scheduling());
    }

    #[test]
    fn test_forward_is_not_an_event() {
        let action = Action::Forward {
            entity: EntityId(1),
            to: StationId(0),
            at: Duration::ZERO,
        };
        assert!(Event::from_action(&action).is_none());
        assert!(!action.is_scheduling());
    }
}
