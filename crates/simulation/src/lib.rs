//! Deterministic discrete-event runner.
//!
//! Given the same stations and the same master seed, a run produces
//! identical entity histories every time.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  SimulationRunner                       │
//! │                                                         │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │   EventScheduler (BTreeMap<EventKey, Event>)       │ │
//! │  │   Ordered by: time, insertion sequence             │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │                             │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │   stations: Vec<AnyStation> (arena by StationId)   │ │
//! │  │   complete() / enqueue() with a StepContext        │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │                             │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │   Actions → schedule events, forward, depart       │ │
//! │  └────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────┘
//! ```

mod builder;
mod event_queue;
mod observer;
mod runner;

pub use builder::NetworkBuilder;
pub use event_queue::{EventKey, EventScheduler};
pub use observer::RunObserver;
pub use runner::{SimulationRunner, SimulationStats};
