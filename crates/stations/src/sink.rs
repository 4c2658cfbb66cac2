//! Terminal sink.

use queuesim_core::{Action, SimulationError, Station, StationStats, StepContext};
use queuesim_types::{EntityId, StationId};
use std::time::Duration;

/// Where entities leave the network, either after service or diverted by
/// a full queue.
#[derive(Debug, Clone)]
pub struct TerminalSink {
    id: StationId,
    name: String,
    departed: u64,
    overflowed: u64,
    stats: StationStats,
}

impl TerminalSink {
    /// Create a sink.
    pub fn new(id: StationId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            departed: 0,
            overflowed: 0,
            stats: StationStats::default(),
        }
    }

    /// Entities that left the network here.
    pub fn departed(&self) -> u64 {
        self.departed
    }

    /// Of those, entities that arrived diverted by a full queue.
    pub fn overflowed(&self) -> u64 {
        self.overflowed
    }
}

impl Station for TerminalSink {
    fn id(&self) -> StationId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn capacity(&self) -> usize {
        0
    }

    fn busy(&self) -> usize {
        0
    }

    fn waiting(&self) -> usize {
        0
    }

    fn stats(&self) -> &StationStats {
        &self.stats
    }

    fn enqueue(
        &mut self,
        entity: EntityId,
        at: Duration,
        ctx: &mut StepContext<'_>,
    ) -> Result<Vec<Action>, SimulationError> {
        let record = ctx.entities.get_mut(entity)?;
        record.departed_at = Some(at);
        if record.overflowed() {
            self.overflowed += 1;
        }
        self.departed += 1;
        self.stats.arrivals += 1;
        Ok(vec![Action::Depart { entity, at }])
    }

    fn dispatch_next(
        &mut self,
        _available: Duration,
        _ctx: &mut StepContext<'_>,
    ) -> Result<Vec<Action>, SimulationError> {
        Ok(Vec::new())
    }

    fn complete(
        &mut self,
        _entity: EntityId,
        _ctx: &mut StepContext<'_>,
    ) -> Result<Vec<Action>, SimulationError> {
        Err(SimulationError::IdleCompletion {
            station: self.name.clone(),
        })
    }
}
