//! Event queue with deterministic ordering.

use queuesim_core::Event;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::Duration;

/// Key for ordering events in the queue.
///
/// Events are ordered by:
/// 1. Time (earlier first)
/// 2. Sequence number (FIFO for events scheduled at the same time)
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct EventKey {
    /// When this event should be processed.
    pub time: Duration,
    /// Insertion sequence number.
    pub sequence: u64,
}

impl Ord for EventKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.time.cmp(&other.time) {
            Ordering::Equal => {}
            ord => return ord,
        }
        self.sequence.cmp(&other.sequence)
    }
}

impl PartialOrd for EventKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Time-ordered event queue. There is no cancellation: every pushed event
/// is eventually popped.
#[derive(Debug, Default, Clone)]
pub struct EventScheduler {
    queue: BTreeMap<EventKey, Event>,
    sequence: u64,
}

impl EventScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an event, returning its key.
    pub fn push(&mut self, event: Event) -> EventKey {
        let key = EventKey {
            time: event.time,
            sequence: self.sequence,
        };
        self.sequence += 1;
        self.queue.insert(key, event);
        key
    }

    /// Remove and return the earliest event.
    pub fn pop(&mut self) -> Option<Event> {
        self.queue.pop_first().map(|(_, event)| event)
    }

    /// Time of the earliest event.
    pub fn peek_time(&self) -> Option<Duration> {
        self.queue.first_key_value().map(|(key, _)| key.time)
    }

    /// Whether no events remain.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Pending events.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Events pushed since creation.
    pub fn scheduled(&self) -> u64 {
        self.sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use queuesim_core::EventKind;
    use queuesim_types::{EntityId, StationId};

    fn event(secs: u64, entity: u64) -> Event {
        Event {
            time: Duration::from_secs(secs),
            station: StationId(1),
            entity: EntityId(entity),
            kind: EventKind::Completion,
        }
    }

    #[test]
    fn test_event_key_ordering() {
        let earlier = EventKey {
            time: Duration::from_secs(1),
            sequence: 2,
        };
        let later = EventKey {
            time: Duration::from_secs(2),
            sequence: 1,
        };
        assert!(earlier < later);
    }

    #[test]
    fn test_sequence_breaks_ties() {
        let first = EventKey {
            time: Duration::from_secs(1),
            sequence: 1,
        };
        let second = EventKey {
            time: Duration::from_secs(1),
            sequence: 2,
        };
        assert!(first < second, "Earlier insertion should fire first");
    }

    #[test]
    fn test_pop_in_time_then_insertion_order() {
        let mut scheduler = EventScheduler::new();
        scheduler.push(event(5, 0));
        scheduler.push(event(1, 1));
        scheduler.push(event(5, 2));
        scheduler.push(event(3, 3));
        assert_eq!(scheduler.len(), 4);
        assert_eq!(scheduler.peek_time(), Some(Duration::from_secs(1)));

        let order: Vec<u64> = std::iter::from_fn(|| scheduler.pop())
            .map(|e| e.entity.0)
            .collect();
        assert_eq!(order, vec![1, 3, 0, 2]);
        assert!(scheduler.is_empty());
        assert_eq!(scheduler.scheduled(), 4);
    }
}
