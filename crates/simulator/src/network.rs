//! The modelled office network.
//!
//! ```text
//!  Start ─► Routing ─► Authentication ──success──► Compilation ◄─┐ retry
//!             ▲  │ full        │    └──────────► DirectSubmission │
//!             │  ▼             │ failure              │    ▲      │
//!             │  End ◄─────────┼──────────┐           ▼    │      │
//!             └────────────────┘        Evaluation ◄──────────────┘
//!                                         │ failure, no dropout
//!                                         └─► Compilation or DirectSubmission
//! ```

use crate::config::{ArrivalRates, EvaluationService, SimulatorConfig};
use queuesim_core::Route;
use queuesim_rng::{BoundedParetoFitter, RandomStreams, ServiceSampler, StreamId};
use queuesim_simulation::NetworkBuilder;
use queuesim_stations::{
    AnyStation, ArrivalConfig, ArrivalGenerator, ArrivalSchedule, PriorityEvaluationStation,
    PriorityStationConfig, ServiceStation, ServiceStationConfig, TerminalSink,
};
use queuesim_types::ConfigError;
use queuesim_validation::theory::{self, TheoryTable, QUEUE_TIME, RESPONSE_TIME, SERVICE_TIME};
use queuesim_validation::ValidationError;
use tracing::info;

/// Station ids and names of the office network.
pub mod office {
    use queuesim_types::StationId;

    pub const START: StationId = StationId(0);
    pub const ROUTING: StationId = StationId(1);
    pub const AUTHENTICATION: StationId = StationId(2);
    pub const COMPILATION: StationId = StationId(3);
    pub const DIRECT_SUBMISSION: StationId = StationId(4);
    pub const EVALUATION: StationId = StationId(5);
    pub const END: StationId = StationId(6);

    /// Station names, indexed by id.
    pub const NAMES: [&str; 7] = [
        "Start",
        "Routing",
        "Authentication",
        "Compilation",
        "DirectSubmission",
        "Evaluation",
        "End",
    ];

    /// Stations that serve entities, in id order.
    pub const SERVICE_STATIONS: [StationId; 5] =
        [ROUTING, AUTHENTICATION, COMPILATION, DIRECT_SUBMISSION, EVALUATION];

    pub fn name(id: StationId) -> &'static str {
        NAMES.get(id.index()).copied().unwrap_or("?")
    }
}

/// Bounded-Pareto evaluation times live on `[mean * LOW, mean * HIGH]`.
const PARETO_LOW_FACTOR: f64 = 0.001;
const PARETO_HIGH_FACTOR: f64 = 8.0;

fn arrival_schedule(config: &SimulatorConfig) -> ArrivalSchedule {
    match &config.arrivals {
        ArrivalRates::Daily(rates) => ArrivalSchedule::Daily(rates.clone()),
        ArrivalRates::Constant(rate) => ArrivalSchedule::Constant {
            rate: *rate,
            days: config.dates.days(),
        },
    }
}

/// Build the office network.
///
/// Arrivals use stream 0 and stations streams 1 to 5 in id order, each with
/// routing on its stream plus 100. Fitting the evaluation service consumes
/// draws from stream 5 before the run starts.
pub fn build_office_network(
    config: &SimulatorConfig,
    streams: &mut RandomStreams,
) -> Result<Vec<AnyStation>, ConfigError> {
    use office::*;

    config.validate()?;
    let office_config = &config.office;
    let mut builder = NetworkBuilder::new();

    builder.add(NAMES[START.index()], |id| {
        let mut arrivals = ArrivalConfig::new(NAMES[id.index()], arrival_schedule(config), ROUTING)
            .with_stream(StreamId(0))
            .with_horizon(config.dates.horizon());
        if let Some(max) = config.max_arrivals {
            arrivals = arrivals.with_max_arrivals(max);
        }
        ArrivalGenerator::new(id, arrivals)
    })?;

    builder.add(NAMES[ROUTING.index()], |id| {
        let routing = &office_config.routing;
        let mut station = ServiceStationConfig::new(
            NAMES[id.index()],
            ServiceSampler::exponential_rate(routing.service_rate)?,
            Route::to(AUTHENTICATION),
        )
        .with_servers(routing.servers)
        .with_stream(StreamId(1));
        if let Some(max) = routing.max_queue_length {
            station = station.with_max_queue(max, END);
        }
        ServiceStation::new(id, station)
    })?;

    builder.add(NAMES[AUTHENTICATION.index()], |id| {
        let auth = &office_config.authentication;
        let route = Route::branch(
            "authentication success",
            auth.success_probability,
            Route::branch(
                "precompiled form",
                auth.precompiled_probability,
                Route::to(COMPILATION),
                Route::to(DIRECT_SUBMISSION),
            )?,
            Route::to(ROUTING),
        )?;
        let station = ServiceStationConfig::new(
            NAMES[id.index()],
            ServiceSampler::exponential_rate(auth.service_rate)?,
            route,
        )
        .with_servers(auth.servers)
        .with_stream(StreamId(2));
        ServiceStation::new(id, station)
    })?;

    builder.add(NAMES[COMPILATION.index()], |id| {
        let compilation = &office_config.compilation;
        let route = Route::branch(
            "compilation success",
            compilation.success_probability,
            Route::to(EVALUATION),
            Route::to(COMPILATION),
        )?;
        let station = ServiceStationConfig::new(
            NAMES[id.index()],
            ServiceSampler::lognormal_from_moments(compilation.mean, compilation.variance)?,
            route,
        )
        .with_servers(compilation.servers)
        .with_stream(StreamId(3));
        ServiceStation::new(id, station)
    })?;

    builder.add(NAMES[DIRECT_SUBMISSION.index()], |id| {
        let station = ServiceStationConfig::new(
            NAMES[id.index()],
            ServiceSampler::near_deterministic(office_config.direct_submission.mean)?,
            Route::to(EVALUATION),
        )
        .with_stream(StreamId(4));
        ServiceStation::new(id, station)
    })?;

    builder.add(NAMES[EVALUATION.index()], |id| {
        let evaluation = &office_config.evaluation;
        let stream = StreamId(5);
        let sampler = match evaluation.service {
            EvaluationService::BoundedPareto => {
                let fitted = BoundedParetoFitter::default().fit(
                    evaluation.mean,
                    evaluation.mean * PARETO_LOW_FACTOR,
                    evaluation.mean * PARETO_HIGH_FACTOR,
                    &mut streams.stream(stream),
                )?;
                ServiceSampler::BoundedPareto(fitted)
            }
            EvaluationService::Exponential => ServiceSampler::exponential(evaluation.mean)?,
        };
        let route = Route::branch(
            "evaluation success",
            evaluation.success_probability,
            Route::to(END),
            Route::branch(
                "dropout",
                evaluation.dropout_probability,
                Route::to(END),
                Route::branch(
                    "resubmit precompiled",
                    evaluation.precompiled_probability,
                    Route::to(COMPILATION),
                    Route::to(DIRECT_SUBMISSION),
                )?,
            )?,
        )?;
        let station = PriorityStationConfig::new(NAMES[id.index()], sampler, evaluation.mean, route)
            .with_servers(evaluation.servers())
            .with_heavy_threshold(evaluation.heavy_threshold)
            .with_direct_source(DIRECT_SUBMISSION)
            .with_stream(stream);
        PriorityEvaluationStation::new(id, station)
    })?;

    builder.add(NAMES[END.index()], |id| {
        Ok::<_, ConfigError>(TerminalSink::new(id, NAMES[id.index()]))
    })?;

    let stations = builder.build()?;
    info!(
        days = config.dates.days(),
        evaluation_servers = office_config.evaluation.servers(),
        "Built office network"
    );
    Ok(stations)
}

/// Theoretical reference values for the office network at a constant
/// arrival rate.
///
/// Solves the traffic equations for per-station arrival rates, then uses
/// M/M/c for routing and authentication (the waiting-line bound is
/// ignored), M/D/1 for direct submission, and M/M/c for evaluation when its
/// service is exponential. Compilation has lognormal service, so only its
/// service time is given.
pub fn office_theory(config: &SimulatorConfig) -> Result<TheoryTable, ValidationError> {
    use office::*;

    let rate = match &config.arrivals {
        ArrivalRates::Constant(rate) => *rate,
        ArrivalRates::Daily(_) => {
            return Err(ValidationError::InvalidParameter(
                "theory needs a constant arrival rate".to_string(),
            ))
        }
    };
    let o = &config.office;
    let (auth, eval) = (&o.authentication, &o.evaluation);

    // Node order: routing, authentication, compilation, direct, evaluation.
    let resubmit = (1.0 - eval.success_probability) * (1.0 - eval.dropout_probability);
    let routing = vec![
        vec![0.0, 1.0, 0.0, 0.0, 0.0],
        vec![
            1.0 - auth.success_probability,
            0.0,
            auth.success_probability * auth.precompiled_probability,
            auth.success_probability * (1.0 - auth.precompiled_probability),
            0.0,
        ],
        vec![
            0.0,
            0.0,
            1.0 - o.compilation.success_probability,
            0.0,
            o.compilation.success_probability,
        ],
        vec![0.0, 0.0, 0.0, 0.0, 1.0],
        vec![
            0.0,
            0.0,
            resubmit * eval.precompiled_probability,
            resubmit * (1.0 - eval.precompiled_probability),
            0.0,
        ],
    ];
    let lambda = theory::solve_traffic(&[rate, 0.0, 0.0, 0.0, 0.0], &routing)?;

    let mut table = TheoryTable::new();
    table.insert_queue(
        office::name(ROUTING),
        &theory::mmc(lambda[0], o.routing.service_rate, servers(o.routing.servers)?)?,
    );
    table.insert_queue(
        office::name(AUTHENTICATION),
        &theory::mmc(lambda[1], auth.service_rate, servers(auth.servers)?)?,
    );
    table.insert(office::name(COMPILATION), SERVICE_TIME, o.compilation.mean);

    // M/D/1: Wq = ρ s / (2 (1 - ρ)).
    let s = o.direct_submission.mean;
    let rho = lambda[3] * s;
    if rho >= 1.0 {
        return Err(ValidationError::Unstable(rho));
    }
    let wait = rho * s / (2.0 * (1.0 - rho));
    let direct = office::name(DIRECT_SUBMISSION);
    table.insert(direct, QUEUE_TIME, wait);
    table.insert(direct, SERVICE_TIME, s);
    table.insert(direct, RESPONSE_TIME, wait + s);

    match eval.service {
        EvaluationService::Exponential => table.insert_queue(
            office::name(EVALUATION),
            &theory::mmc(lambda[4], 1.0 / eval.mean, servers(eval.servers())?)?,
        ),
        EvaluationService::BoundedPareto => {
            table.insert(office::name(EVALUATION), SERVICE_TIME, eval.mean)
        }
    }
    Ok(table)
}

fn servers(count: usize) -> Result<u32, ValidationError> {
    u32::try_from(count)
        .map_err(|_| ValidationError::InvalidParameter(format!("{count} servers")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DateRange, OfficeConfig};
    use queuesim_core::Station;
    use queuesim_stations::StationKind;

    fn exponential_office() -> OfficeConfig {
        let mut office = OfficeConfig::default();
        office.evaluation.service = EvaluationService::Exponential;
        office
    }

    #[test]
    fn test_office_wiring() {
        let config = SimulatorConfig::default();
        let mut streams = RandomStreams::new(1);
        let stations = build_office_network(&config, &mut streams).unwrap();
        assert_eq!(stations.len(), office::NAMES.len());
        for (station, name) in stations.iter().zip(office::NAMES) {
            assert_eq!(station.name(), name);
        }
        assert_eq!(stations[0].kind(), StationKind::Source);
        assert_eq!(stations[5].kind(), StationKind::Priority);
        assert_eq!(stations[6].kind(), StationKind::Sink);
        assert_eq!(
            stations[5].capacity(),
            config.office.evaluation.servers()
        );

        let mut auth = stations[2].successors();
        auth.sort();
        assert_eq!(
            auth,
            vec![office::ROUTING, office::COMPILATION, office::DIRECT_SUBMISSION]
        );
        let mut routing = stations[1].successors();
        routing.sort();
        assert_eq!(routing, vec![office::AUTHENTICATION, office::END]);
    }

    #[test]
    fn test_fitting_consumes_evaluation_stream_only() {
        let config = SimulatorConfig::default();
        let mut streams = RandomStreams::new(9);
        let before = streams.clone();
        build_office_network(&config, &mut streams).unwrap();
        assert_ne!(streams.seed(StreamId(5)), before.seed(StreamId(5)));
        for id in [0, 1, 2, 3, 4, 105] {
            assert_eq!(streams.seed(StreamId(id)), before.seed(StreamId(id)));
        }

        let exponential = SimulatorConfig::default().with_office(exponential_office());
        let mut streams = RandomStreams::new(9);
        build_office_network(&exponential, &mut streams).unwrap();
        assert_eq!(streams, before);
    }

    #[test]
    fn test_invalid_config_fails_before_building() {
        let mut office = OfficeConfig::default();
        office.compilation.servers = 0;
        let config = SimulatorConfig::default().with_office(office);
        let mut streams = RandomStreams::new(1);
        assert!(build_office_network(&config, &mut streams).is_err());
    }

    #[test]
    fn test_theory_balances_flows() {
        let config = SimulatorConfig::new(DateRange::default(), ArrivalRates::Constant(0.002))
            .with_office(exponential_office());
        let table = office_theory(&config).unwrap();
        let routing_wait = table.get("Routing", QUEUE_TIME).unwrap();
        assert!(routing_wait > 0.0);
        assert_eq!(table.get("Compilation", QUEUE_TIME), None);
        assert_eq!(table.get("Compilation", SERVICE_TIME), Some(600.0));
        let direct = table.get("DirectSubmission", RESPONSE_TIME).unwrap();
        assert!(direct > 60.0);
        assert!(table.get("Evaluation", RESPONSE_TIME).is_some());

        let daily = SimulatorConfig::new(DateRange::default(), ArrivalRates::Daily(vec![0.01]));
        assert!(office_theory(&daily).is_err());
    }
}
