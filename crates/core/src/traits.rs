//! The station interface.

use crate::{Action, SimulationError, StationStats, StepContext};
use queuesim_types::{EntityId, StationId};
use std::time::Duration;

/// A node of the queueing network.
///
/// Every station kind (service, priority, sink, source) implements this
/// trait, and these methods are the only mutators of a station's state.
/// Stations are:
///
/// - **Synchronous**: no method blocks; waiting is a scheduled event
/// - **Deterministic**: same state, same streams and same input give the
///   same actions
/// - **Isolated**: no references to other stations; successors are
///   [`StationId`]s resolved by the runner
///
/// # Example
///
/// ```ignore
/// let actions = station.enqueue(entity, now, &mut ctx)?;
/// for action in actions {
///     runner.process_action(action)?;
/// }
/// ```
pub trait Station {
    /// Arena index of this station.
    fn id(&self) -> StationId;

    /// Human-readable name used in logs and exported records.
    fn name(&self) -> &str;

    /// Number of servers.
    fn capacity(&self) -> usize;

    /// Servers currently busy. Always `<= capacity()`.
    fn busy(&self) -> usize;

    /// Entities waiting for a server.
    fn waiting(&self) -> usize;

    /// Counters accumulated so far.
    fn stats(&self) -> &StationStats;

    /// Actions to run once before the first event (sources schedule their
    /// first arrival here).
    fn start(&mut self, _ctx: &mut StepContext<'_>) -> Result<Vec<Action>, SimulationError> {
        Ok(Vec::new())
    }

    /// Accept `entity` at time `at`.
    ///
    /// # Returns
    ///
    /// Actions for the runner: a scheduled completion when a server is free,
    /// a forward to an overflow sink when the queue is full, or a departure
    /// for sinks.
    fn enqueue(
        &mut self,
        entity: EntityId,
        at: Duration,
        ctx: &mut StepContext<'_>,
    ) -> Result<Vec<Action>, SimulationError>;

    /// Start service on the next waiting entity if a server is free.
    ///
    /// `available` is the earliest time the freed server can start.
    fn dispatch_next(
        &mut self,
        available: Duration,
        ctx: &mut StepContext<'_>,
    ) -> Result<Vec<Action>, SimulationError>;

    /// Handle the event scheduled for `entity` at this station.
    ///
    /// For service stations this releases the server, dispatches the next
    /// waiting entity and routes `entity` onwards. For sources it releases
    /// the new entity and schedules the following arrival.
    fn complete(
        &mut self,
        entity: EntityId,
        ctx: &mut StepContext<'_>,
    ) -> Result<Vec<Action>, SimulationError>;
}
