//! Single runs and chained replications.

use crate::config::{LoadError, SimulatorConfig};
use crate::daily::DailyStatsCollector;
use crate::metrics::{MetricsCollector, SimulationReport};
use crate::network::build_office_network;
use crate::visit_log::VisitLog;
use queuesim_core::SimulationError;
use queuesim_rng::{RandomStreams, StreamId};
use queuesim_simulation::SimulationRunner;
use queuesim_types::ConfigError;
use queuesim_validation::{ObservationSet, ValidationError};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::info;

/// Errors running the simulator.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("simulation aborted: {0}")]
    Simulation(#[from] SimulationError),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to create histogram: {0}")]
    Histogram(#[from] hdrhistogram::CreationError),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("invalid replication count: {0}")]
    Replications(u32),
}

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: SimulationReport,
    /// Per-visit sequences after the warm-up.
    pub observations: ObservationSet,
    /// Master seed the run was planted with.
    pub seed: u64,
    /// State of stream 0 when the run ended.
    pub final_seed: u64,
    /// Where the daily statistics were written.
    pub output: Option<PathBuf>,
}

/// Run the office network once.
///
/// When `config.output` is set, the daily statistics are written there.
pub fn run_simulation(config: &SimulatorConfig, replica: Option<u32>) -> Result<RunOutcome, RunError> {
    let started = Instant::now();
    let mut streams = RandomStreams::new(config.seed);
    let stations = build_office_network(config, &mut streams)?;
    let mut runner = SimulationRunner::with_streams(stations, streams);

    let mut daily = DailyStatsCollector::new(config.dates, config.seed).with_warm_up(config.warm_up);
    if let Some(replica) = replica {
        daily = daily.with_replica(replica);
    }
    let mut observers = (
        daily,
        (
            MetricsCollector::new()?.with_warm_up(config.warm_up),
            VisitLog::new().with_warm_up(config.warm_up),
        ),
    );
    runner.run(&mut observers)?;
    let (daily, (metrics, log)) = observers;

    if let Some(path) = &config.output {
        daily.write_file(path)?;
    }
    let report = metrics.report(runner.stats(), started.elapsed());
    let final_seed = runner.streams().seed(StreamId(0));
    info!(
        seed = config.seed,
        final_seed,
        departures = report.departures,
        ignored = daily.ignored(),
        "Run complete"
    );
    Ok(RunOutcome {
        report,
        observations: log.into_observations(),
        seed: config.seed,
        final_seed,
        output: config.output.clone(),
    })
}

/// Run `replications` replicas in sequence.
///
/// Replica `i + 1` is planted with the final stream-0 state of replica `i`.
/// With an output path, replica `i` writes `<stem>_rep<i>.<ext>`.
pub fn run_replications(config: &SimulatorConfig, replications: u32) -> Result<Vec<RunOutcome>, RunError> {
    if replications == 0 {
        return Err(RunError::Replications(replications));
    }
    let mut outcomes = Vec::with_capacity(replications as usize);
    let mut seed = config.seed;
    for replica in 0..replications {
        let mut replica_config = config.clone().with_seed(seed);
        replica_config.output = config.output.as_deref().map(|p| replica_path(p, replica));
        info!(replica, seed, "Starting replica");
        let outcome = run_simulation(&replica_config, Some(replica))?;
        seed = outcome.final_seed;
        outcomes.push(outcome);
    }
    Ok(outcomes)
}

/// `dir/name.ext` becomes `dir/name_rep<replica>.ext`.
pub fn replica_path(base: &Path, replica: u32) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match base.extension() {
        Some(ext) => format!("{stem}_rep{replica}.{}", ext.to_string_lossy()),
        None => format!("{stem}_rep{replica}"),
    };
    base.with_file_name(name)
}
