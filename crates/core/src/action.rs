//! Actions emitted by stations.

use queuesim_types::{EntityId, StationId};
use std::time::Duration;

/// Something a station asks the runner to do.
///
/// Scheduling actions become events in the queue; `Forward` and `Depart`
/// are carried out within the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Fire a service completion for `entity` at `station` at time `at`.
    ScheduleCompletion {
        station: StationId,
        entity: EntityId,
        at: Duration,
    },
    /// Fire the arrival of a freshly created `entity` from `station` at `at`.
    ScheduleArrival {
        station: StationId,
        entity: EntityId,
        at: Duration,
    },
    /// Enqueue `entity` at station `to` at time `at`.
    Forward {
        entity: EntityId,
        to: StationId,
        at: Duration,
    },
    /// `entity` left the network at `at`.
    Depart { entity: EntityId, at: Duration },
}

impl Action {
    /// Whether the action turns into a queued event.
    pub fn is_scheduling(&self) -> bool {
        matches!(
            self,
            Action::ScheduleCompletion { .. } | Action::ScheduleArrival { .. }
        )
    }
}
