//! Core types for the queueing network simulator.
//!
//! Everything here is plain data: identifiers, the entity and its visit
//! history, priority classes and configuration errors. Behaviour lives in
//! the station and simulation crates.

mod entity;
mod error;
mod identifiers;
mod time;

pub use entity::{Entity, PriorityClass, VisitRecord};
pub use error::ConfigError;
pub use identifiers::{EntityId, StationId};
pub use time::{day_index, secs, secs_f64, SECONDS_PER_DAY};
