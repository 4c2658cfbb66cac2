//! Per-turn context handed to station handlers.

use crate::SimulationError;
use queuesim_rng::RandomStreams;
use queuesim_types::{Entity, EntityId, StationId};
use std::collections::BTreeMap;
use std::time::Duration;

/// Entities currently inside the network, keyed by id.
#[derive(Debug, Default, Clone)]
pub struct EntityStore {
    entities: BTreeMap<EntityId, Entity>,
    next_id: EntityId,
}

impl EntityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new entity arriving from `source` at `at`.
    pub fn spawn(&mut self, source: StationId, at: Duration) -> EntityId {
        let id = self.next_id;
        self.next_id = id.next();
        self.entities.insert(id, Entity::new(id, source, at));
        id
    }

    /// Look up an entity.
    pub fn get(&self, id: EntityId) -> Result<&Entity, SimulationError> {
        self.entities
            .get(&id)
            .ok_or(SimulationError::UnknownEntity(id))
    }

    /// Look up an entity mutably.
    pub fn get_mut(&mut self, id: EntityId) -> Result<&mut Entity, SimulationError> {
        self.entities
            .get_mut(&id)
            .ok_or(SimulationError::UnknownEntity(id))
    }

    /// Remove an entity that left the network.
    pub fn remove(&mut self, id: EntityId) -> Result<Entity, SimulationError> {
        self.entities
            .remove(&id)
            .ok_or(SimulationError::UnknownEntity(id))
    }

    /// Entities still in the network.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the network is empty.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Total entities ever created.
    pub fn spawned(&self) -> u64 {
        self.next_id.0
    }

    /// Iterate over entities in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }
}

/// Mutable state a station may touch while handling one event.
///
/// Stations never hold references to each other or to the streams; the
/// runner lends them this context for the duration of a call.
pub struct StepContext<'a> {
    /// Current simulated time.
    pub now: Duration,
    /// Entity store.
    pub entities: &'a mut EntityStore,
    /// Random streams. Stations draw only on the streams they were assigned.
    pub streams: &'a mut RandomStreams,
}

impl<'a> StepContext<'a> {
    /// Create a context for one turn.
    pub fn new(now: Duration, entities: &'a mut EntityStore, streams: &'a mut RandomStreams) -> Self {
        Self {
            now,
            entities,
            streams,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_and_remove() {
        let mut store = EntityStore::new();
        let a = store.spawn(StationId(0), Duration::from_secs(1));
        let b = store.spawn(StationId(0), Duration::from_secs(2));
        assert_eq!(a, EntityId(0));
        assert_eq!(b, EntityId(1));
        assert_eq!(store.len(), 2);

        let removed = store.remove(a).unwrap();
        assert_eq!(removed.arrived_at, Duration::from_secs(1));
        assert_eq!(store.len(), 1);
        assert_eq!(store.spawned(), 2);
        assert_eq!(store.remove(a), Err(SimulationError::UnknownEntity(a)));
    }
}
