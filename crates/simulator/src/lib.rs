//! Queueing network simulator.
//!
//! Builds the modelled office network from a scenario, runs it on the
//! deterministic runner and collects what leaves it:
//!
//! - **Configuration**: scenario files in TOML or JSON, validated into a
//!   [`SimulatorConfig`]
//! - **Network**: the office stations, their streams and routing
//! - **Daily statistics**: per-day aggregates exported as NDJSON
//! - **Observations**: per-visit sequences for the batch-means validator
//! - **Metrics**: response-time percentiles and station utilization
//! - **Replications**: chained replicas, each planted with the last
//!   stream-0 state of the one before
//!
//! # Example
//!
//! ```no_run
//! use queuesim_simulator::{run_simulation, ArrivalRates, DateRange, SimulatorConfig};
//! use chrono::NaiveDate;
//!
//! let dates = DateRange::new(
//!     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
//! );
//! let config = SimulatorConfig::new(dates, ArrivalRates::Constant(0.002)).with_seed(42);
//! let outcome = run_simulation(&config, None).unwrap();
//! outcome.report.print_summary();
//! ```

pub mod config;
pub mod daily;
pub mod metrics;
pub mod network;
pub mod replication;
pub mod visit_log;

pub use config::{
    ArrivalRates, AuthenticationConfig, CompilationConfig, DateRange, DirectSubmissionConfig,
    EvaluationConfig, EvaluationService, LoadError, OfficeConfig, RoutingConfig, ScenarioConfig,
    SimulatorConfig,
};
pub use daily::{read_daily_observations, DailyRecord, DailyStatsCollector, StationDayStats};
pub use metrics::{MetricsCollector, SimulationReport, StationSummary};
pub use network::{build_office_network, office, office_theory};
pub use replication::{replica_path, run_replications, run_simulation, RunError, RunOutcome};
pub use visit_log::VisitLog;
