//! Station state machines.
//!
//! Four station kinds make up a network:
//!
//! - [`ServiceStation`]: multi-server FIFO queue with optional bounded
//!   waiting line and probabilistic routing
//! - [`PriorityEvaluationStation`]: three non-preemptive priority
//!   sub-queues, classified by the service demand drawn at enqueue
//! - [`TerminalSink`]: where entities leave the network
//! - [`ArrivalGenerator`]: Poisson source driven by a daily rate schedule
//!
//! [`AnyStation`] wraps them so the runner can keep one arena.

mod any;
mod priority;
mod service;
mod sink;
mod source;
mod visit;

pub use any::{AnyStation, StationKind};
pub use priority::{PriorityEvaluationStation, PriorityStationConfig, DEFAULT_HEAVY_THRESHOLD};
pub use service::{ServiceStation, ServiceStationConfig};
pub use sink::TerminalSink;
pub use source::{ArrivalConfig, ArrivalGenerator, ArrivalSchedule};
