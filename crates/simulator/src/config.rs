//! Configuration types for the simulator.
//!
//! [`ScenarioConfig`] is the on-disk shape (TOML or JSON). It is validated
//! into a [`SimulatorConfig`], the in-memory configuration the network
//! builder and runner consume.

use chrono::NaiveDate;
use queuesim_types::{ConfigError, SECONDS_PER_DAY};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors loading a scenario file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TOML scenario: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON scenario: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported scenario extension: {0:?}")]
    UnsupportedFormat(Option<String>),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Inclusive calendar range covered by a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Number of days, counting both ends.
    pub fn days(&self) -> u64 {
        (self.end - self.start).num_days().max(0) as u64 + 1
    }

    /// Calendar date of simulated day `day`.
    pub fn date_of(&self, day: u64) -> NaiveDate {
        self.start + chrono::Days::new(day)
    }

    /// End of the last day as a simulated offset.
    pub fn horizon(&self) -> Duration {
        Duration::from_secs(self.days() * SECONDS_PER_DAY)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.end < self.start {
            return Err(ConfigError::Invalid(format!(
                "date range ends ({}) before it starts ({})",
                self.end, self.start
            )));
        }
        Ok(())
    }
}

impl Default for DateRange {
    fn default() -> Self {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default();
        Self { start, end: start }
    }
}

/// Arrival rates in arrivals per second.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrivalRates {
    /// One rate per day of the date range; later days reuse the last rate.
    Daily(Vec<f64>),
    /// The same rate every day.
    Constant(f64),
}

impl Default for ArrivalRates {
    fn default() -> Self {
        ArrivalRates::Constant(0.002)
    }
}

/// The front desk that routes incoming requests.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    pub servers: usize,
    /// Completions per second per server.
    pub service_rate: f64,
    /// Waiting-line bound; arrivals beyond it leave immediately.
    pub max_queue_length: Option<usize>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            servers: 1,
            service_rate: 0.5,
            max_queue_length: Some(100),
        }
    }
}

/// Login step; failures go back to routing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthenticationConfig {
    pub servers: usize,
    pub service_rate: f64,
    pub success_probability: f64,
    /// Share of successful logins that continue to form compilation.
    pub precompiled_probability: f64,
}

impl Default for AuthenticationConfig {
    fn default() -> Self {
        Self {
            servers: 1,
            service_rate: 0.2,
            success_probability: 0.9,
            precompiled_probability: 0.7,
        }
    }
}

/// Form compilation with lognormal service; failures retry in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompilationConfig {
    pub servers: usize,
    pub mean: f64,
    pub variance: f64,
    pub success_probability: f64,
}

impl Default for CompilationConfig {
    fn default() -> Self {
        Self {
            servers: 10,
            mean: 600.0,
            variance: 90_000.0,
            success_probability: 0.8,
        }
    }
}

/// Direct submission with a near-constant service time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectSubmissionConfig {
    pub mean: f64,
}

impl Default for DirectSubmissionConfig {
    fn default() -> Self {
        Self { mean: 60.0 }
    }
}

/// Service-time family of the evaluation station.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationService {
    /// Bounded Pareto on `[mean * 0.001, mean * 8]`, fitted to `mean`.
    #[default]
    BoundedPareto,
    /// Exponential with the configured mean, for checks against theory.
    Exponential,
}

/// Case evaluation with three priority classes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluationConfig {
    pub employees: usize,
    pub cases_per_employee: usize,
    pub mean: f64,
    #[serde(default)]
    pub service: EvaluationService,
    pub success_probability: f64,
    /// Among failures, share that leaves without resubmitting.
    pub dropout_probability: f64,
    /// Among resubmissions, share that goes through compilation.
    pub precompiled_probability: f64,
    #[serde(default = "default_heavy_threshold")]
    pub heavy_threshold: f64,
}

fn default_heavy_threshold() -> f64 {
    queuesim_stations::DEFAULT_HEAVY_THRESHOLD
}

impl EvaluationConfig {
    /// Parallel servers: employees times concurrent cases each.
    pub fn servers(&self) -> usize {
        self.employees * self.cases_per_employee
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            employees: 12,
            cases_per_employee: 4,
            mean: 14_400.0,
            service: EvaluationService::default(),
            success_probability: 0.8,
            dropout_probability: 0.3,
            precompiled_probability: 0.5,
            heavy_threshold: default_heavy_threshold(),
        }
    }
}

/// Parameters of every station in the office network.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OfficeConfig {
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub authentication: AuthenticationConfig,
    #[serde(default)]
    pub compilation: CompilationConfig,
    #[serde(default)]
    pub direct_submission: DirectSubmissionConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

impl OfficeConfig {
    /// Check every numeric domain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let routing = &self.routing;
        check_servers("Routing", routing.servers)?;
        ConfigError::check_positive("routing.service_rate", routing.service_rate)?;

        let auth = &self.authentication;
        check_servers("Authentication", auth.servers)?;
        ConfigError::check_positive("authentication.service_rate", auth.service_rate)?;
        ConfigError::check_probability("authentication.success_probability", auth.success_probability)?;
        ConfigError::check_probability(
            "authentication.precompiled_probability",
            auth.precompiled_probability,
        )?;

        let compilation = &self.compilation;
        check_servers("Compilation", compilation.servers)?;
        ConfigError::check_positive("compilation.mean", compilation.mean)?;
        ConfigError::check_positive("compilation.variance", compilation.variance)?;
        ConfigError::check_probability(
            "compilation.success_probability",
            compilation.success_probability,
        )?;

        ConfigError::check_positive("direct_submission.mean", self.direct_submission.mean)?;

        let evaluation = &self.evaluation;
        check_servers("Evaluation", evaluation.servers())?;
        ConfigError::check_positive("evaluation.mean", evaluation.mean)?;
        ConfigError::check_positive("evaluation.heavy_threshold", evaluation.heavy_threshold)?;
        ConfigError::check_probability(
            "evaluation.success_probability",
            evaluation.success_probability,
        )?;
        ConfigError::check_probability(
            "evaluation.dropout_probability",
            evaluation.dropout_probability,
        )?;
        ConfigError::check_probability(
            "evaluation.precompiled_probability",
            evaluation.precompiled_probability,
        )?;
        Ok(())
    }
}

fn check_servers(station: &str, servers: usize) -> Result<(), ConfigError> {
    if servers == 0 {
        return Err(ConfigError::ZeroCapacity {
            station: station.to_string(),
        });
    }
    Ok(())
}

/// Configuration for a simulation run.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulatorConfig {
    /// Calendar range; arrivals stop at the end of the last day.
    pub dates: DateRange,

    /// Arrival rate schedule.
    pub arrivals: ArrivalRates,

    /// Stop generating after this many arrivals.
    pub max_arrivals: Option<u64>,

    /// Station parameters.
    pub office: OfficeConfig,

    /// Entities arriving before this offset are left out of statistics.
    pub warm_up: Duration,

    /// Master seed for the random streams.
    pub seed: u64,

    /// NDJSON output path; replicas append `_rep<i>` to the stem.
    pub output: Option<PathBuf>,
}

impl SimulatorConfig {
    /// Create a configuration over `dates` with default stations.
    pub fn new(dates: DateRange, arrivals: ArrivalRates) -> Self {
        Self {
            dates,
            arrivals,
            max_arrivals: None,
            office: OfficeConfig::default(),
            warm_up: Duration::ZERO,
            seed: 123_456_789,
            output: None,
        }
    }

    /// Set the station parameters.
    pub fn with_office(mut self, office: OfficeConfig) -> Self {
        self.office = office;
        self
    }

    /// Cap the number of arrivals.
    pub fn with_max_arrivals(mut self, max: u64) -> Self {
        self.max_arrivals = Some(max);
        self
    }

    /// Set the warm-up period.
    pub fn with_warm_up(mut self, warm_up: Duration) -> Self {
        self.warm_up = warm_up;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Write daily statistics to `path`.
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Check dates, rates and station parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dates.validate()?;
        match &self.arrivals {
            ArrivalRates::Daily(rates) => {
                if rates.is_empty() {
                    return Err(ConfigError::Invalid("no daily arrival rates".to_string()));
                }
                for &rate in rates {
                    ConfigError::check_positive("daily arrival rate", rate)?;
                }
            }
            ArrivalRates::Constant(rate) => {
                ConfigError::check_positive("arrival rate", *rate)?;
            }
        }
        self.office.validate()
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self::new(DateRange::default(), ArrivalRates::default())
    }
}

/// Scenario file contents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub dates: DateRange,
    pub arrivals: ArrivalRates,
    #[serde(default)]
    pub max_arrivals: Option<u64>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub warm_up_days: u64,
    #[serde(flatten)]
    pub office: OfficeConfig,
}

impl ScenarioConfig {
    /// Read a scenario, choosing TOML or JSON by file extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("toml") => Self::from_toml(&text),
            Some("json") => Self::from_json(&text),
            _ => Err(LoadError::UnsupportedFormat(extension)),
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, LoadError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_json(text: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Validate into a run configuration. `seed` overrides the file's seed.
    pub fn into_config(self, seed: Option<u64>) -> Result<SimulatorConfig, ConfigError> {
        let mut config = SimulatorConfig::new(self.dates, self.arrivals)
            .with_office(self.office)
            .with_warm_up(Duration::from_secs(self.warm_up_days * SECONDS_PER_DAY));
        if let Some(seed) = seed.or(self.seed) {
            config = config.with_seed(seed);
        }
        if let Some(max) = self.max_arrivals {
            config = config.with_max_arrivals(max);
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML_SCENARIO: &str = r#"
seed = 42
warm_up_days = 2

[dates]
start = "2024-03-01"
end = "2024-03-10"

[arrivals]
daily = [0.01, 0.02, 0.03]

[routing]
servers = 2
service_rate = 1.0
max_queue_length = 50

[evaluation]
employees = 4
cases_per_employee = 2
mean = 3600.0
service = "exponential"
success_probability = 0.7
dropout_probability = 0.2
precompiled_probability = 0.4
"#;

    #[test]
    fn test_toml_scenario_fills_defaults() {
        let scenario = ScenarioConfig::from_toml(TOML_SCENARIO).unwrap();
        assert_eq!(scenario.dates.days(), 10);
        assert_eq!(scenario.office.routing.servers, 2);
        assert_eq!(scenario.office.evaluation.servers(), 8);
        assert_eq!(scenario.office.evaluation.service, EvaluationService::Exponential);
        assert_eq!(scenario.office.evaluation.heavy_threshold, 1.5);
        assert_eq!(scenario.office.compilation, CompilationConfig::default());

        let config = scenario.into_config(None).unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.warm_up, Duration::from_secs(2 * SECONDS_PER_DAY));
        assert_eq!(config.arrivals, ArrivalRates::Daily(vec![0.01, 0.02, 0.03]));
    }

    #[test]
    fn test_json_scenario_and_seed_override() {
        let json = r#"{
            "dates": {"start": "2024-01-01", "end": "2024-01-01"},
            "arrivals": {"constant": 0.1},
            "max_arrivals": 500
        }"#;
        let config = ScenarioConfig::from_json(json)
            .unwrap()
            .into_config(Some(7))
            .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.max_arrivals, Some(500));
        assert_eq!(config.dates.horizon(), Duration::from_secs(SECONDS_PER_DAY));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut office = OfficeConfig::default();
        office.authentication.success_probability = 1.5;
        let config = SimulatorConfig::default().with_office(office);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidProbability { .. })
        ));

        let mut office = OfficeConfig::default();
        office.evaluation.employees = 0;
        assert!(matches!(
            office.validate(),
            Err(ConfigError::ZeroCapacity { .. })
        ));

        let config = SimulatorConfig::new(DateRange::default(), ArrivalRates::Constant(0.0));
        assert!(config.validate().is_err());

        let backwards = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );
        assert!(SimulatorConfig::new(backwards, ArrivalRates::default())
            .validate()
            .is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let text = TOML_SCENARIO.replace("servers = 2", "servers = 2\nspeed = 3");
        assert!(matches!(
            ScenarioConfig::from_toml(&text),
            Err(LoadError::Toml(_))
        ));
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("scenario.toml");
        std::fs::write(&toml_path, TOML_SCENARIO).unwrap();
        assert!(ScenarioConfig::load(&toml_path).is_ok());

        let yaml_path = dir.path().join("scenario.yaml");
        std::fs::write(&yaml_path, "seed: 1").unwrap();
        assert!(matches!(
            ScenarioConfig::load(&yaml_path),
            Err(LoadError::UnsupportedFormat(Some(ext))) if ext == "yaml"
        ));
        assert!(matches!(
            ScenarioConfig::load(dir.path().join("missing.toml")),
            Err(LoadError::Io(_))
        ));
    }

    #[test]
    fn test_date_helpers() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 2, 27).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
        );
        assert_eq!(range.days(), 5);
        assert_eq!(range.date_of(2), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }
}
