//! Poisson arrival source.

use queuesim_core::{Action, SimulationError, Station, StationStats, StepContext};
use queuesim_rng::StreamId;
use queuesim_types::{day_index, secs, ConfigError, EntityId, StationId, SECONDS_PER_DAY};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Arrival rates, in arrivals per simulated second.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrivalSchedule {
    /// One rate per simulated day. Days past the end reuse the last rate.
    Daily(Vec<f64>),
    /// The same rate for `days` days.
    Constant { rate: f64, days: u64 },
}

impl ArrivalSchedule {
    /// Rate in effect on day `day`.
    pub fn rate_on(&self, day: u64) -> f64 {
        match self {
            ArrivalSchedule::Daily(rates) => {
                let index = (day as usize).min(rates.len().saturating_sub(1));
                rates.get(index).copied().unwrap_or(0.0)
            }
            ArrivalSchedule::Constant { rate, .. } => *rate,
        }
    }

    /// Number of scheduled days.
    pub fn days(&self) -> u64 {
        match self {
            ArrivalSchedule::Daily(rates) => rates.len() as u64,
            ArrivalSchedule::Constant { days, .. } => *days,
        }
    }

    /// End of the last scheduled day.
    pub fn horizon(&self) -> Duration {
        Duration::from_secs(self.days().saturating_mul(SECONDS_PER_DAY))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            ArrivalSchedule::Daily(rates) => {
                if rates.is_empty() {
                    return Err(ConfigError::Invalid(
                        "daily arrival schedule is empty".to_string(),
                    ));
                }
                for &rate in rates {
                    ConfigError::check_positive("daily arrival rate", rate)?;
                }
            }
            ArrivalSchedule::Constant { rate, .. } => {
                ConfigError::check_positive("arrival rate", *rate)?;
            }
        }
        Ok(())
    }
}

/// Configuration for an [`ArrivalGenerator`].
#[derive(Debug, Clone, PartialEq)]
pub struct ArrivalConfig {
    /// Source name.
    pub name: String,

    /// Rate schedule.
    pub schedule: ArrivalSchedule,

    /// First station every entity visits.
    pub target: StationId,

    /// Stream used for inter-arrival times.
    pub stream: StreamId,

    /// No arrival is scheduled after this time. Defaults to the end of the schedule.
    pub horizon: Option<Duration>,

    /// Stop after this many arrivals.
    pub max_arrivals: Option<u64>,
}

impl ArrivalConfig {
    /// Source feeding `target` on stream 0.
    pub fn new(name: impl Into<String>, schedule: ArrivalSchedule, target: StationId) -> Self {
        Self {
            name: name.into(),
            schedule,
            target,
            stream: StreamId(0),
            horizon: None,
            max_arrivals: None,
        }
    }

    /// Set the inter-arrival stream.
    pub fn with_stream(mut self, stream: StreamId) -> Self {
        self.stream = stream;
        self
    }

    /// Set an explicit horizon.
    pub fn with_horizon(mut self, horizon: Duration) -> Self {
        self.horizon = Some(horizon);
        self
    }

    /// Cap the number of arrivals.
    pub fn with_max_arrivals(mut self, max: u64) -> Self {
        self.max_arrivals = Some(max);
        self
    }
}

/// Poisson source whose rate follows the day of the previous arrival.
#[derive(Debug, Clone)]
pub struct ArrivalGenerator {
    id: StationId,
    config: ArrivalConfig,
    horizon: Duration,
    generated: u64,
    arrivals_by_day: BTreeMap<u64, u64>,
    stats: StationStats,
}

impl ArrivalGenerator {
    /// Build a source, validating the schedule.
    pub fn new(id: StationId, config: ArrivalConfig) -> Result<Self, ConfigError> {
        config.schedule.validate()?;
        let horizon = config.horizon.unwrap_or_else(|| config.schedule.horizon());
        Ok(Self {
            id,
            config,
            horizon,
            generated: 0,
            arrivals_by_day: BTreeMap::new(),
            stats: StationStats::default(),
        })
    }

    /// Last instant at which an arrival may be scheduled.
    pub fn horizon(&self) -> Duration {
        self.horizon
    }

    /// First station every entity visits.
    pub fn target(&self) -> StationId {
        self.config.target
    }

    /// Entities created so far.
    pub fn generated(&self) -> u64 {
        self.generated
    }

    /// Entities created on day `day`.
    pub fn arrivals_on(&self, day: u64) -> u64 {
        self.arrivals_by_day.get(&day).copied().unwrap_or(0)
    }

    /// Arrival counts keyed by day index.
    pub fn arrivals_by_day(&self) -> &BTreeMap<u64, u64> {
        &self.arrivals_by_day
    }

    /// Draw the next arrival after `from`, unless the source is exhausted.
    fn schedule_next(
        &mut self,
        from: Duration,
        ctx: &mut StepContext<'_>,
    ) -> Result<Vec<Action>, SimulationError> {
        if self
            .config
            .max_arrivals
            .is_some_and(|max| self.generated >= max)
        {
            debug!(source = %self.config.name, generated = self.generated, "Arrival limit reached");
            return Ok(Vec::new());
        }
        let rate = self.config.schedule.rate_on(day_index(from));
        let gap = ctx.streams.stream(self.config.stream).exponential(1.0 / rate);
        let next = from.saturating_add(secs(gap));
        if next > self.horizon {
            debug!(source = %self.config.name, generated = self.generated, "Arrival horizon reached");
            return Ok(Vec::new());
        }

        let entity = ctx.entities.spawn(self.id, next);
        self.generated += 1;
        *self.arrivals_by_day.entry(day_index(next)).or_default() += 1;
        Ok(vec![Action::ScheduleArrival {
            station: self.id,
            entity,
            at: next,
        }])
    }
}

impl Station for ArrivalGenerator {
    fn id(&self) -> StationId {
        self.id
    }

    fn name(&self) -> &str {
        &self.config.name
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

    fn start(&mut self, ctx: &mut StepContext<'_>) -> Result<Vec<Action>, SimulationError> {
        self.schedule_next(ctx.now, ctx)
    }

    fn enqueue(
        &mut self,
        _entity: EntityId,
        _at: Duration,
        _ctx: &mut StepContext<'_>,
    ) -> Result<Vec<Action>, SimulationError> {
        Err(SimulationError::NotAccepting {
            station: self.config.name.clone(),
        })
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
        entity: EntityId,
        ctx: &mut StepContext<'_>,
    ) -> Result<Vec<Action>, SimulationError> {
        self.stats.completions += 1;
        let mut actions = vec![Action::Forward {
            entity,
            to: self.config.target,
            at: ctx.now,
        }];
        actions.extend(self.schedule_next(ctx.now, ctx)?);
        Ok(actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use queuesim_core::EntityStore;
    use queuesim_rng::RandomStreams;

    #[test]
    fn test_daily_schedule_reuses_last_rate() {
        let schedule = ArrivalSchedule::Daily(vec![0.5, 2.0]);
        assert_eq!(schedule.rate_on(0), 0.5);
        assert_eq!(schedule.rate_on(1), 2.0);
        assert_eq!(schedule.rate_on(40), 2.0);
        assert_eq!(schedule.horizon(), Duration::from_secs(2 * SECONDS_PER_DAY));
    }

    #[test]
    fn test_invalid_schedules_rejected() {
        let target = StationId(1);
        for schedule in [
            ArrivalSchedule::Daily(vec![]),
            ArrivalSchedule::Daily(vec![1.0, 0.0]),
            ArrivalSchedule::Constant { rate: -2.0, days: 3 },
        ] {
            let config = ArrivalConfig::new("Start", schedule, target);
            assert!(ArrivalGenerator::new(StationId(0), config).is_err());
        }
    }

    #[test]
    fn test_generation_stops_at_horizon() {
        let mut entities = EntityStore::new();
        let mut streams = RandomStreams::new(10);
        let mut ctx = StepContext::new(Duration::ZERO, &mut entities, &mut streams);
        let config = ArrivalConfig::new(
            "Start",
            ArrivalSchedule::Constant { rate: 1.0, days: 1 },
            StationId(1),
        )
        .with_horizon(Duration::from_secs(1000));
        let mut source = ArrivalGenerator::new(StationId(0), config).unwrap();

        let mut actions = source.start(&mut ctx).unwrap();
        let mut forwarded = 0;
        while let Some(Action::ScheduleArrival { entity, at, .. }) = actions.pop() {
            assert!(at <= Duration::from_secs(1000));
            ctx.now = at;
            let next = source.complete(entity, &mut ctx).unwrap();
            assert!(matches!(next[0], Action::Forward { to: StationId(1), .. }));
            forwarded += 1;
            actions = next.into_iter().skip(1).collect();
        }
        assert_eq!(forwarded, source.generated());
        // Poisson(1000): well inside five standard deviations.
        assert!((850..=1150).contains(&source.generated()));
        assert_eq!(source.arrivals_on(0), source.generated());
    }

    #[test]
    fn test_max_arrivals_caps_generation() {
        let mut entities = EntityStore::new();
        let mut streams = RandomStreams::new(11);
        let mut ctx = StepContext::new(Duration::ZERO, &mut entities, &mut streams);
        let config = ArrivalConfig::new(
            "Start",
            ArrivalSchedule::Constant { rate: 5.0, days: 10 },
            StationId(1),
        )
        .with_max_arrivals(3);
        let mut source = ArrivalGenerator::new(StationId(0), config).unwrap();

        let mut pending = source.start(&mut ctx).unwrap();
        while let Some(Action::ScheduleArrival { entity, at, .. }) = pending.pop() {
            ctx.now = at;
            pending = source.complete(entity, &mut ctx).unwrap().split_off(1);
        }
        assert_eq!(source.generated(), 3);
        assert_eq!(ctx.entities.spawned(), 3);
    }

    #[test]
    fn test_source_rejects_entities() {
        let mut entities = EntityStore::new();
        let mut streams = RandomStreams::new(12);
        let mut ctx = StepContext::new(Duration::ZERO, &mut entities, &mut streams);
        let config = ArrivalConfig::new(
            "Start",
            ArrivalSchedule::Constant { rate: 1.0, days: 1 },
            StationId(1),
        );
        let mut source = ArrivalGenerator::new(StationId(0), config).unwrap();
        let e = ctx.entities.spawn(StationId(0), Duration::ZERO);
        assert!(source.enqueue(e, Duration::ZERO, &mut ctx).is_err());
    }
}
