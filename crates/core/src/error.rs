//! Errors that abort a simulation run.

use queuesim_types::{EntityId, StationId};
use thiserror::Error;

/// A failure inside a station handler. Any of these ends the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// An action or event referred to a station outside the arena.
    #[error("unknown station {0}")]
    UnknownStation(StationId),

    /// An action or event referred to an entity that is not in the store.
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    /// The station kind cannot receive entities.
    #[error("station {station} does not accept entities")]
    NotAccepting { station: String },

    /// A completion fired while no server was busy.
    #[error("completion at idle station {station}")]
    IdleCompletion { station: String },

    /// The entity has no open visit at the station handling it.
    #[error("{entity} has no visit at {station}")]
    MissingVisit { entity: EntityId, station: String },
}
