//! Core types for the queueing simulator.
//!
//! Stations are state machines: they receive an entity (or a completion)
//! and answer with [`Action`]s. The runner owns the clock, the event queue
//! and the entity store, and turns actions into new events or into
//! synchronous hand-offs between stations.

mod action;
mod context;
mod error;
mod event;
mod routing;
mod stats;
mod traits;

pub use action::Action;
pub use context::{EntityStore, StepContext};
pub use error::SimulationError;
pub use event::{Event, EventKind};
pub use routing::Route;
pub use stats::StationStats;
pub use traits::Station;
