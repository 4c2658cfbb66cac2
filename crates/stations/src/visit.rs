use queuesim_core::{EntityStore, SimulationError};
use queuesim_types::{EntityId, StationId, VisitRecord};

/// The entity's open visit at `station`: its last record, which must
/// belong to that station.
pub(crate) fn open_visit<'a>(
    entities: &'a mut EntityStore,
    entity: EntityId,
    station: StationId,
    name: &str,
) -> Result<&'a mut VisitRecord, SimulationError> {
    entities
        .get_mut(entity)?
        .last_visit_mut()
        .filter(|v| v.station == station)
        .ok_or_else(|| SimulationError::MissingVisit {
            entity,
            station: name.to_string(),
        })
}
