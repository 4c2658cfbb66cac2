//! Tagged union over the station kinds.

use crate::{ArrivalGenerator, PriorityEvaluationStation, ServiceStation, TerminalSink};
use queuesim_core::{Action, SimulationError, Station, StationStats, StepContext};
use queuesim_types::{EntityId, StationId};
use std::fmt;
use std::time::Duration;

/// Station kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StationKind {
    /// Generic FIFO service station.
    Service,
    /// Priority evaluation station.
    Priority,
    /// Terminal sink.
    Sink,
    /// Arrival source.
    Source,
}

impl fmt::Display for StationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StationKind::Service => "service",
            StationKind::Priority => "priority",
            StationKind::Sink => "sink",
            StationKind::Source => "source",
        };
        f.write_str(s)
    }
}

/// Any station that can live in the simulation arena.
#[derive(Debug, Clone)]
pub enum AnyStation {
    Service(ServiceStation),
    Priority(PriorityEvaluationStation),
    Sink(TerminalSink),
    Source(ArrivalGenerator),
}

impl AnyStation {
    /// Kind tag.
    pub fn kind(&self) -> StationKind {
        match self {
            AnyStation::Service(_) => StationKind::Service,
            AnyStation::Priority(_) => StationKind::Priority,
            AnyStation::Sink(_) => StationKind::Sink,
            AnyStation::Source(_) => StationKind::Source,
        }
    }

    /// Whether entities can be forwarded here.
    pub fn accepts_entities(&self) -> bool {
        !matches!(self, AnyStation::Source(_))
    }

    /// The source, if this is one.
    pub fn as_source(&self) -> Option<&ArrivalGenerator> {
        match self {
            AnyStation::Source(source) => Some(source),
            _ => None,
        }
    }

    /// The sink, if this is one.
    pub fn as_sink(&self) -> Option<&TerminalSink> {
        match self {
            AnyStation::Sink(sink) => Some(sink),
            _ => None,
        }
    }

    /// The priority station, if this is one.
    pub fn as_priority(&self) -> Option<&PriorityEvaluationStation> {
        match self {
            AnyStation::Priority(station) => Some(station),
            _ => None,
        }
    }

    /// Every station this one can send entities to.
    pub fn successors(&self) -> Vec<StationId> {
        match self {
            AnyStation::Service(s) => {
                let mut targets = s.config().route.targets();
                if let Some((_, sink)) = s.config().overflow {
                    targets.push(sink);
                }
                targets
            }
            AnyStation::Priority(s) => s.config().route.targets(),
            AnyStation::Sink(_) => Vec::new(),
            AnyStation::Source(s) => vec![s.target()],
        }
    }

    fn inner(&self) -> &dyn Station {
        match self {
            AnyStation::Service(s) => s,
            AnyStation::Priority(s) => s,
            AnyStation::Sink(s) => s,
            AnyStation::Source(s) => s,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Station {
        match self {
            AnyStation::Service(s) => s,
            AnyStation::Priority(s) => s,
            AnyStation::Sink(s) => s,
            AnyStation::Source(s) => s,
        }
    }
}

impl Station for AnyStation {
    fn id(&self) -> StationId {
        self.inner().id()
    }

    fn name(&self) -> &str {
        self.inner().name()
    }

    fn capacity(&self) -> usize {
        self.inner().capacity()
    }

    fn busy(&self) -> usize {
        self.inner().busy()
    }

    fn waiting(&self) -> usize {
        self.inner().waiting()
    }

    fn stats(&self) -> &StationStats {
        self.inner().stats()
    }

    fn start(&mut self, ctx: &mut StepContext<'_>) -> Result<Vec<Action>, SimulationError> {
        self.inner_mut().start(ctx)
    }

    fn enqueue(
        &mut self,
        entity: EntityId,
        at: Duration,
        ctx: &mut StepContext<'_>,
    ) -> Result<Vec<Action>, SimulationError> {
        self.inner_mut().enqueue(entity, at, ctx)
    }

    fn dispatch_next(
        &mut self,
        available: Duration,
        ctx: &mut StepContext<'_>,
    ) -> Result<Vec<Action>, SimulationError> {
        self.inner_mut().dispatch_next(available, ctx)
    }

    fn complete(
        &mut self,
        entity: EntityId,
        ctx: &mut StepContext<'_>,
    ) -> Result<Vec<Action>, SimulationError> {
        self.inner_mut().complete(entity, ctx)
    }
}

impl From<ServiceStation> for AnyStation {
    fn from(station: ServiceStation) -> Self {
        AnyStation::Service(station)
    }
}

impl From<PriorityEvaluationStation> for AnyStation {
    fn from(station: PriorityEvaluationStation) -> Self {
        AnyStation::Priority(station)
    }
}

impl From<TerminalSink> for AnyStation {
    fn from(station: TerminalSink) -> Self {
        AnyStation::Sink(station)
    }
}

impl From<ArrivalGenerator> for AnyStation {
    fn from(station: ArrivalGenerator) -> Self {
        AnyStation::Source(station)
    }
}
