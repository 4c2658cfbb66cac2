//! Batch-means validation of simulated runs against queueing theory.

use queuesim_simulation::SimulationRunner;
use queuesim_simulator::VisitLog;
use queuesim_test_helpers::{single_server_network, source_priority_network};
use queuesim_validation::theory::{mm1, mmc, priority_mmc_waits, QUEUE_TIME, RESPONSE_TIME, SERVICE_TIME};
use queuesim_validation::{TheoryTable, Validator, DEFAULT_BATCH_CANDIDATES};

/// λ = 0.5, μ = 1: Wq = 1, S = 1, W = 2.
#[test]
fn test_single_server_against_mm1() {
    let stations = single_server_network(0.5, 1.0, 100_000).unwrap();
    let mut runner = SimulationRunner::new(stations, 31_337);
    let mut log = VisitLog::new();
    runner.run(&mut log).unwrap();

    let observations = log.into_observations();
    assert_eq!(observations.get("Desk", QUEUE_TIME).map(<[f64]>::len), Some(100_000));

    let mut theory = TheoryTable::new();
    theory.insert_queue("Desk", &mm1(0.5, 1.0).unwrap());
    let report = Validator::new().validate(&observations, &theory).unwrap();

    assert!(DEFAULT_BATCH_CANDIDATES.contains(&report.batch_count));
    assert_eq!(report.rows.len(), 3);
    for metric in [QUEUE_TIME, SERVICE_TIME, RESPONSE_TIME] {
        let row = report.row("Desk", metric).unwrap();
        assert_eq!(row.batches, report.batch_count);
        let error = (row.simulated_mean - row.theoretical).abs() / row.theoretical;
        assert!(error < 0.15, "{metric}: {} vs {}", row.simulated_mean, row.theoretical);
        assert!(row.half_width.is_finite() && row.half_width > 0.0);
    }
    let total = report.total_response.unwrap();
    assert!((total.theoretical - 2.0).abs() < 1e-12);
    assert!(total.relative_error().abs() < 0.15);
}

/// λ = 1.5 over two servers with μ = 1, 30% direct: Cobham gives
/// Wq ≈ 0.415 for direct and ≈ 1.659 for the rest.
#[test]
fn test_two_class_priority_against_cobham() {
    let stations = source_priority_network(1.5, 0.3, 2, 100_000).unwrap();
    let mut runner = SimulationRunner::new(stations, 4_242);
    let mut log = VisitLog::new();
    runner.run(&mut log).unwrap();
    let observations = log.into_observations();
    assert!(observations.get("Evaluation/heavy", QUEUE_TIME).is_none());

    let waits = priority_mmc_waits(&[0.45, 1.05], 1.0, 2).unwrap();
    assert!(waits[0] < waits[1]);
    let mut theory = TheoryTable::new();
    theory.insert("Evaluation/direct", QUEUE_TIME, waits[0]);
    theory.insert("Evaluation/light", QUEUE_TIME, waits[1]);
    theory.insert_queue("Evaluation", &mmc(1.5, 1.0, 2).unwrap());
    let report = Validator::new().validate(&observations, &theory).unwrap();

    assert_eq!(report.rows.len(), 5);
    for service in ["Evaluation/direct", "Evaluation/light"] {
        let row = report.row(service, QUEUE_TIME).unwrap();
        let error = (row.simulated_mean - row.theoretical).abs() / row.theoretical;
        assert!(error < 0.15, "{service}: {} vs {}", row.simulated_mean, row.theoretical);
    }
    // Priority reorders waits but keeps their overall mean.
    let overall = report.row("Evaluation", QUEUE_TIME).unwrap();
    let mixed = 0.3 * waits[0] + 0.7 * waits[1];
    assert!((overall.theoretical - mixed).abs() < 1e-9);
    assert!((overall.simulated_mean - mixed).abs() / mixed < 0.15);
}
