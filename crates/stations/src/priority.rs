//! Priority evaluation station.
//!
//! Three sub-queues served non-preemptively in strict order. The service
//! duration is drawn when the entity arrives and decides its class, so an
//! entity's own future demand places it in the light or heavy queue.

use crate::visit::open_visit;
use queuesim_core::{Action, Route, SimulationError, Station, StationStats, StepContext};
use queuesim_rng::{ServiceSampler, StreamId};
use queuesim_types::{ConfigError, EntityId, PriorityClass, StationId, VisitRecord};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::trace;

/// Multiple of the configured mean above which a demand counts as heavy.
pub const DEFAULT_HEAVY_THRESHOLD: f64 = 1.5;

/// Configuration for a [`PriorityEvaluationStation`].
#[derive(Debug, Clone, PartialEq)]
pub struct PriorityStationConfig {
    /// Station name.
    pub name: String,

    /// Number of parallel servers.
    pub servers: usize,

    /// Service-time distribution, sampled at enqueue.
    pub sampler: ServiceSampler,

    /// Configured mean service time, the reference for classification.
    pub mean: f64,

    /// Demands above `heavy_threshold * mean` go to the heavy queue.
    pub heavy_threshold: f64,

    /// Entities arriving straight from this station are always `Direct`.
    pub direct_source: Option<StationId>,

    /// Routing after service. Every draw, the resubmission path included,
    /// uses `routing_stream`, keeping service times on their own stream.
    pub route: Route,

    /// Stream used for service times.
    pub service_stream: StreamId,

    /// Stream used for routing draws.
    pub routing_stream: StreamId,
}

impl PriorityStationConfig {
    /// Single-server station with the default heavy threshold.
    pub fn new(
        name: impl Into<String>,
        sampler: ServiceSampler,
        mean: f64,
        route: Route,
    ) -> Self {
        Self {
            name: name.into(),
            servers: 1,
            sampler,
            mean,
            heavy_threshold: DEFAULT_HEAVY_THRESHOLD,
            direct_source: None,
            route,
            service_stream: StreamId(0),
            routing_stream: StreamId(100),
        }
    }

    /// Set the number of servers.
    pub fn with_servers(mut self, servers: usize) -> Self {
        self.servers = servers;
        self
    }

    /// Set the station whose entities are classified `Direct`.
    pub fn with_direct_source(mut self, station: StationId) -> Self {
        self.direct_source = Some(station);
        self
    }

    /// Set the heavy-demand threshold as a multiple of the mean.
    pub fn with_heavy_threshold(mut self, threshold: f64) -> Self {
        self.heavy_threshold = threshold;
        self
    }

    /// Use `service` for service times and `service + 100` for routing.
    pub fn with_stream(mut self, service: StreamId) -> Self {
        self.service_stream = service;
        self.routing_stream = service.offset(100);
        self
    }
}

/// Non-preemptive three-class priority station.
#[derive(Debug, Clone)]
pub struct PriorityEvaluationStation {
    id: StationId,
    config: PriorityStationConfig,
    busy: usize,
    queues: [VecDeque<EntityId>; 3],
    dispatched_by_class: [u64; 3],
    stats: StationStats,
}

impl PriorityEvaluationStation {
    /// Build a station.
    pub fn new(id: StationId, config: PriorityStationConfig) -> Result<Self, ConfigError> {
        if config.servers == 0 {
            return Err(ConfigError::ZeroCapacity {
                station: config.name,
            });
        }
        ConfigError::check_positive("priority station mean", config.mean)?;
        ConfigError::check_positive("heavy threshold", config.heavy_threshold)?;
        Ok(Self {
            id,
            config,
            busy: 0,
            queues: Default::default(),
            dispatched_by_class: [0; 3],
            stats: StationStats::default(),
        })
    }

    /// Station configuration.
    pub fn config(&self) -> &PriorityStationConfig {
        &self.config
    }

    /// Entities waiting in one sub-queue.
    pub fn waiting_in(&self, class: PriorityClass) -> usize {
        self.queues[class.rank()].len()
    }

    /// Services started for one class.
    pub fn dispatched_in(&self, class: PriorityClass) -> u64 {
        self.dispatched_by_class[class.rank()]
    }

    /// Class for an entity coming from `previous` with demand `demand`.
    pub fn classify(&self, previous: Option<StationId>, demand: Duration) -> PriorityClass {
        if previous.is_some() && previous == self.config.direct_source {
            PriorityClass::Direct
        } else if demand.as_secs_f64() > self.config.heavy_threshold * self.config.mean {
            PriorityClass::Heavy
        } else {
            PriorityClass::Light
        }
    }
}

impl Station for PriorityEvaluationStation {
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
        self.queues.iter().map(VecDeque::len).sum()
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
        let demand = self
            .config
            .sampler
            .sample_duration(&mut ctx.streams.stream(self.config.service_stream));
        let record = ctx.entities.get_mut(entity)?;
        let class = self.classify(record.previous_station(), demand);

        let queue = &mut self.queues[class.rank()];
        let mut visit = VisitRecord::new(self.id, at, queue.len());
        visit.drawn_service_duration = Some(demand);
        visit.priority_class = Some(class);
        record.push_visit(visit);
        queue.push_back(entity);
        self.stats.arrivals += 1;
        trace!(station = %self.config.name, %entity, %class, "Classified");

        let actions = if self.busy < self.config.servers {
            self.dispatch_next(at, ctx)?
        } else {
            Vec::new()
        };
        self.stats.max_waiting = self.stats.max_waiting.max(self.waiting());
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
        let Some((class, entity)) = PriorityClass::ALL
            .into_iter()
            .find_map(|class| self.queues[class.rank()].pop_front().map(|e| (class, e)))
        else {
            return Ok(Vec::new());
        };
        self.busy += 1;

        let visit = open_visit(ctx.entities, entity, self.id, &self.config.name)?;
        let demand = visit.drawn_service_duration.unwrap_or_default();
        let start = available.max(visit.enqueue_time);
        let end = start.saturating_add(demand);
        visit.service_start_time = Some(start);
        visit.service_end_time = Some(end);

        self.dispatched_by_class[class.rank()] += 1;
        self.stats.dispatched += 1;
        self.stats.busy_time += demand;
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
