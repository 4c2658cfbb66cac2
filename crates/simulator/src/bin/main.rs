//! Queueing network simulator CLI
//!
//! Run the office network from a scenario file, or check exported daily
//! statistics against queueing-theory reference values.
//!
//! # Example
//!
//! ```bash
//! # Three chained replicas with a fixed seed
//! queuesim run --config office.toml --seed 42 --replications 3 --output out/daily.ndjson
//!
//! # Batch-means check of the exported day means
//! queuesim validate --observations out/daily_rep0.ndjson --theory theory.json
//! ```

use clap::{Parser, Subcommand};
use queuesim_simulator::{
    office_theory, read_daily_observations, run_replications, ScenarioConfig,
};
use queuesim_validation::{TheoryTable, Validator, DEFAULT_BATCH_CANDIDATES};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "queuesim")]
#[command(about = "Discrete-event simulator for a queueing network of service stations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation
    Run {
        /// Scenario file (.toml or .json)
        #[arg(short, long)]
        config: PathBuf,

        /// Master seed. When omitted, the scenario seed or a random one is used.
        #[arg(long)]
        seed: Option<u64>,

        /// Number of chained replicas
        #[arg(short, long, default_value = "1")]
        replications: u32,

        /// NDJSON output path for daily statistics
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the queueing-theory reference table to this path
        #[arg(long)]
        theory: Option<PathBuf>,

        /// Check per-visit observations against the reference table
        #[arg(long)]
        validate: bool,
    },

    /// Validate exported daily statistics
    Validate {
        /// NDJSON file written by `run`
        #[arg(long)]
        observations: PathBuf,

        /// Reference table (JSON: service -> metric -> value)
        #[arg(long)]
        theory: PathBuf,

        /// Candidate batch counts (comma-separated)
        #[arg(long, value_delimiter = ',')]
        candidates: Option<Vec<usize>>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,queuesim_simulator=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            seed,
            replications,
            output,
            theory,
            validate,
        } => {
            let scenario = ScenarioConfig::load(&config)?;
            let seed = seed.or(scenario.seed).unwrap_or_else(rand::random);
            let mut config = scenario.into_config(Some(seed))?;
            if let Some(output) = output {
                config = config.with_output(output);
            }
            info!(seed, replications, days = config.dates.days(), "Starting simulation");

            let reference = match (&theory, validate) {
                (None, false) => None,
                _ => Some(office_theory(&config)?),
            };
            if let (Some(path), Some(table)) = (&theory, &reference) {
                std::fs::write(path, table.to_json()?)?;
                info!(path = %path.display(), "Wrote reference table");
            }

            let outcomes = run_replications(&config, replications)?;
            for (replica, outcome) in outcomes.iter().enumerate() {
                println!("Replica {replica} (seed {})", outcome.seed);
                outcome.report.print_summary();
                if let (true, Some(table)) = (validate, &reference) {
                    let report = Validator::new().validate(&outcome.observations, table)?;
                    report.print_summary();
                }
            }
        }

        Commands::Validate {
            observations,
            theory,
            candidates,
        } => {
            let observations = read_daily_observations(&observations)?;
            if observations.is_empty() {
                warn!("No daily summaries found");
            }
            let table = TheoryTable::from_json(&std::fs::read_to_string(&theory)?)?;
            let candidates = candidates.unwrap_or_else(|| DEFAULT_BATCH_CANDIDATES.to_vec());
            let report = Validator::new()
                .with_candidates(candidates)
                .validate(&observations, &table)?;
            report.print_summary();
            if !report.all_passed() {
                warn!(failed = report.failed(), "Some checks failed");
            }
        }
    }

    Ok(())
}
