//! Generic multi-server FIFO station.

use crate::visit::open_visit;
use queuesim_core::{Action, Route, SimulationError, Station, StationStats, StepContext};
use queuesim_rng::{ServiceSampler, StreamId};
use queuesim_types::{ConfigError, EntityId, StationId, VisitRecord};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::trace;

/// Configuration for a [`ServiceStation`].
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceStationConfig {
    /// Station name.
    pub name: String,

    /// Number of parallel servers.
    pub servers: usize,

    /// Service-time distribution.
    pub sampler: ServiceSampler,

    /// Routing after service.
    pub route: Route,

    /// Waiting-line bound and the station receiving diverted entities.
    pub overflow: Option<(usize, StationId)>,

    /// Stream used for service times.
    pub service_stream: StreamId,

    /// Stream used for routing draws.
    pub routing_stream: StreamId,
}

impl ServiceStationConfig {
    /// Single-server station with unbounded queue, drawing on streams 0/100.
    pub fn new(name: impl Into<String>, sampler: ServiceSampler, route: Route) -> Self {
        Self {
            name: name.into(),
            servers: 1,
            sampler,
            route,
            overflow: None,
            service_stream: StreamId(0),
            routing_stream: StreamId(100),
        }
    }

    /// Set the number of servers.
    pub fn with_servers(mut self, servers: usize) -> Self {
        self.servers = servers;
        self
    }

    /// Bound the waiting line; entities finding it full go to `sink`.
    pub fn with_max_queue(mut self, max_queue_length: usize, sink: StationId) -> Self {
        self.overflow = Some((max_queue_length, sink));
        self
    }

    /// Use `service` for service times and `service + 100` for routing.
    pub fn with_stream(mut self, service: StreamId) -> Self {
        self.service_stream = service;
        self.routing_stream = service.offset(100);
        self
    }

    /// Override the routing stream.
    pub fn with_routing_stream(mut self, routing: StreamId) -> Self {
        self.routing_stream = routing;
        self
    }
}

/// Multi-server FIFO queue with probabilistic routing.
#[derive(Debug, Clone)]
pub struct ServiceStation {
    id: StationId,
    config: ServiceStationConfig,
    busy: usize,
    waiting: VecDeque<EntityId>,
    stats: StationStats,
}

impl ServiceStation {
    /// Build a station, rejecting configurations without servers.
    pub fn new(id: StationId, config: ServiceStationConfig) -> Result<Self, ConfigError> {
        if config.servers == 0 {
            return Err(ConfigError::ZeroCapacity {
                station: config.name,
            });
        }
        Ok(Self {
            id,
            config,
            busy: 0,
            waiting: VecDeque::new(),
            stats: StationStats::default(),
        })
    }

    /// Station configuration.
    pub fn config(&self) -> &ServiceStationConfig {
        &self.config
    }

    fn is_full(&self) -> Option<StationId> {
        let (max, sink) = self.config.overflow?;
        (self.busy >= self.config.servers && self.waiting.len() >= max).then_some(sink)
    }
}

impl Station for ServiceStation {
    fn id(&self) -> StationId {
        self.id
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn capacity(&self) -> usize {
        self.config.servers
    }

    fn busy(&self) -> usize {
        self.busy
    }

    fn waiting(&self) -> usize {
        self.waiting.len()
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
        if let Some(sink) = self.is_full() {
            self.stats.overflowed += 1;
            ctx.entities.get_mut(entity)?.overflowed_at = Some(self.id);
            trace!(station = %self.config.name, %entity, "Queue full, diverting");
            return Ok(vec![Action::Forward {
                entity,
                to: sink,
                at,
            }]);
        }

        let visit = VisitRecord::new(self.id, at, self.waiting.len());
        ctx.entities.get_mut(entity)?.push_visit(visit);
        self.waiting.push_back(entity);
        self.stats.arrivals += 1;

        let actions = if self.busy < self.config.servers {
            self.dispatch_next(at, ctx)?
        } else {
            Vec::new()
        };
        self.stats.max_waiting = self.stats.max_waiting.max(self.waiting.len());
        Ok(actions)
    }

    fn dispatch_next(
        &mut self,
        available: Duration,
        ctx: &mut StepContext<'_>,
    ) -> Result<Vec<Action>, SimulationError> {
        if self.busy >= self.config.servers {
            return Ok(Vec::new());
        }
        let Some(entity) = self.waiting.pop_front() else {
            return Ok(Vec::new());
        };
        self.busy += 1;

        let duration = self
            .config
            .sampler
            .sample_duration(&mut ctx.streams.stream(self.config.service_stream));
        let visit = open_visit(ctx.entities, entity, self.id, &self.config.name)?;
        let start = available.max(visit.enqueue_time);
        let end = start.saturating_add(duration);
        visit.service_start_time = Some(start);
        visit.service_end_time = Some(end);

        self.stats.dispatched += 1;
        self.stats.busy_time += duration;
        Ok(vec![Action::ScheduleCompletion {
            station: self.id,
            entity,
            at: end,
        }])
    }

    fn complete(
        &mut self,
        entity: EntityId,
        ctx: &mut StepContext<'_>,
    ) -> Result<Vec<Action>, SimulationError> {
        if self.busy == 0 {
            return Err(SimulationError::IdleCompletion {
                station: self.config.name.clone(),
            });
        }
        let end = open_visit(ctx.entities, entity, self.id, &self.config.name)?
            .service_end_time
            .unwrap_or(ctx.now);
        self.busy -= 1;
        self.stats.completions += 1;

        let mut actions = self.dispatch_next(end, ctx)?;
        let next = self
            .config
            .route
            .resolve(&mut ctx.streams.stream(self.config.routing_stream));
        actions.push(Action::Forward {
            entity,
            to: next,
            at: end,
        });
        Ok(actions)
    }
}
