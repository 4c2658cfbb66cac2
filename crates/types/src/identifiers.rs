//! Domain-specific identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity identifier, unique within one simulation run.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Get the next identifier in allocation order.
    pub fn next(self) -> Self {
        EntityId(self.0 + 1)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Station identifier: the station's index in the simulation arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StationId(pub u32);

impl StationId {
    /// Index into the station arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Station({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_next() {
        assert_eq!(EntityId(7).next(), EntityId(8));
    }

    #[test]
    fn test_station_id_index() {
        assert_eq!(StationId(3).index(), 3);
        assert_eq!(StationId(3).to_string(), "Station(3)");
    }
}
