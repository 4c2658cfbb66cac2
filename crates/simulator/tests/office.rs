//! End-to-end runs of the office network.

use chrono::NaiveDate;
use queuesim_rng::RandomStreams;
use queuesim_simulation::SimulationRunner;
use queuesim_simulator::{
    build_office_network, office, read_daily_observations, run_replications, run_simulation,
    ArrivalRates, DailyRecord, DateRange, OfficeConfig, RoutingConfig, SimulatorConfig,
};
use queuesim_test_helpers::DepartureLog;
use queuesim_validation::theory::{QUEUE_TIME, RESPONSE_TIME};

fn twenty_days() -> SimulatorConfig {
    let dates = DateRange::new(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(),
    );
    SimulatorConfig::new(dates, ArrivalRates::Constant(0.002)).with_seed(4242)
}

fn congested_routing() -> SimulatorConfig {
    let office = OfficeConfig {
        routing: RoutingConfig {
            servers: 1,
            service_rate: 0.001,
            max_queue_length: Some(1),
        },
        ..Default::default()
    };
    twenty_days().with_office(office)
}

#[test]
fn test_office_entities_depart_in_order() {
    let config = twenty_days();
    let mut streams = RandomStreams::new(config.seed);
    let stations = build_office_network(&config, &mut streams).unwrap();
    let mut runner = SimulationRunner::with_streams(stations, streams);
    let mut log = DepartureLog::default();
    runner.run(&mut log).unwrap();

    assert!(log.entities.len() > 1000, "only {} departures", log.entities.len());
    assert_eq!(runner.stats().departures, log.entities.len() as u64);
    for entity in &log.entities {
        assert!(entity.is_causally_ordered(), "{} out of order", entity.id);
        assert_eq!(entity.visits.first().map(|v| v.station), Some(office::ROUTING));
        for visit in &entity.visits {
            assert_eq!(
                visit.priority_class.is_some(),
                visit.station == office::EVALUATION,
                "class tag at {}",
                visit.station
            );
        }
    }
    // Every entity reaches evaluation or leaves through it.
    assert!(log
        .entities
        .iter()
        .all(|e| e.previous_station() == Some(office::EVALUATION)));
}

#[test]
fn test_office_run_is_deterministic() {
    let config = twenty_days();
    let first = run_simulation(&config, None).unwrap();
    let second = run_simulation(&config, None).unwrap();

    assert_eq!(first.final_seed, second.final_seed);
    assert_eq!(first.report.departures, second.report.departures);
    assert_eq!(first.report.stations, second.report.stations);
    assert_eq!(first.observations, second.observations);

    let other = run_simulation(&config.clone().with_seed(4243), None).unwrap();
    assert_ne!(first.observations, other.observations);
}

#[test]
fn test_overflow_reaches_end_and_is_counted() {
    let config = congested_routing();
    let mut streams = RandomStreams::new(config.seed);
    let stations = build_office_network(&config, &mut streams).unwrap();
    let mut runner = SimulationRunner::with_streams(stations, streams);
    let mut log = DepartureLog::default();
    runner.run(&mut log).unwrap();

    let overflowed: Vec<_> = log.entities.iter().filter(|e| e.overflowed()).collect();
    assert!(!overflowed.is_empty());
    assert_eq!(runner.stats().overflowed, overflowed.len() as u64);
    for entity in overflowed {
        assert_eq!(entity.overflowed_at, Some(office::ROUTING));
    }
}

#[test]
fn test_daily_ndjson_export() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("daily.ndjson");
    let config = congested_routing().with_output(&path);
    let outcome = run_simulation(&config, Some(7)).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let records: Vec<DailyRecord> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert!(matches!(&records[0], DailyRecord::Metadata(m) if m.replica_id == Some(7)));
    let Some(DailyRecord::Completion(completion)) = records.last() else {
        panic!("missing completion record");
    };
    assert_eq!(completion.total_departed, outcome.report.departures);

    let days: Vec<_> = records
        .iter()
        .filter_map(|r| match r {
            DailyRecord::DailySummary(day) => Some(day),
            _ => None,
        })
        .collect();
    assert!(days.windows(2).all(|w| w[0].date < w[1].date));
    let arrived: u64 = days.iter().map(|d| d.summary.arrived).sum();
    assert_eq!(arrived, outcome.report.arrivals);
    let full: u64 = days.iter().map(|d| d.summary.found_queue_full).sum();
    assert_eq!(full, outcome.report.overflowed);
    assert!(full > 0);

    let observations = read_daily_observations(&path).unwrap();
    assert_eq!(observations.get("Routing", QUEUE_TIME).map(<[f64]>::len), Some(20));
    assert!(observations.get("Evaluation", RESPONSE_TIME).is_some());
    assert!(observations.get("Evaluation/heavy", QUEUE_TIME).is_some());
}

#[test]
fn test_replicas_chain_seeds() {
    let dir = tempfile::tempdir().unwrap();
    let config = twenty_days().with_output(dir.path().join("run.ndjson"));
    let outcomes = run_replications(&config, 3).unwrap();

    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].seed, 4242);
    assert_eq!(outcomes[1].seed, outcomes[0].final_seed);
    assert_eq!(outcomes[2].seed, outcomes[1].final_seed);
    for replica in 0..3 {
        assert!(dir.path().join(format!("run_rep{replica}.ndjson")).exists());
    }
    assert_ne!(outcomes[0].observations, outcomes[1].observations);
}
