//! # Configuration
//!
//! Settings for the Flare client, its middleware, the solution providers
//! and logging. Values are layered with the `config` crate: built-in
//! defaults, then an optional file, then `IGNITION__`-prefixed environment
//! variables (`IGNITION__FLARE__KEY`, `IGNITION__FLARE__REPORT_LEVEL`, ...).

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::error::{IgnitionError, Result};
use crate::logging::LoggingConfig;
use crate::similarity::{NameSimilarityRanker, DEFAULT_SIMILARITY_THRESHOLD};
use crate::solutions::providers::BUILTIN_PROVIDERS;

/// Names accepted in `ignition.recorders`
pub const RECORDER_NAMES: &[&str] = &["dumps", "jobs", "logs", "queries"];

/// Default cap of the Flare report queue
pub const DEFAULT_MAX_QUEUED_REPORTS: usize = 50;

/// Default base URL of the Flare API
pub const DEFAULT_BASE_URL: &str = "https://flareapp.io/api";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnitionConfig {
    pub flare: FlareConfig,
    pub ignition: SolutionsConfig,
    pub logging: LoggingConfig,
}

impl IgnitionConfig {
    /// Loads `.env`, the optional file and the environment, then validates
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv::dotenv().ok();

        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let cfg = builder
            .add_source(
                config::Environment::with_prefix("IGNITION")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config = Self::try_from(cfg)?;
        config.validate()?;

        tracing::debug!(
            path = ?path,
            stage = %config.flare.stage,
            report_level = %config.flare.report_level,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Checks ranges and names that serde cannot
    pub fn validate(&self) -> Result<()> {
        self.flare.report_level()?;

        if self.flare.maximum_number_of_queued_reports == 0 {
            return Err(IgnitionError::InvalidConfig(
                "flare.maximum_number_of_queued_reports must be greater than 0".to_string(),
            ));
        }

        let middleware = &self.flare.middleware;
        let capacities = [
            (middleware.add_logs.enabled, "flare.middleware.add_logs.maximum_number_of_collected_logs", middleware.add_logs.maximum_number_of_collected_logs),
            (middleware.add_queries.enabled, "flare.middleware.add_queries.maximum_number_of_collected_queries", middleware.add_queries.maximum_number_of_collected_queries),
            (middleware.add_jobs.enabled, "flare.middleware.add_jobs.maximum_number_of_collected_jobs", middleware.add_jobs.maximum_number_of_collected_jobs),
            (middleware.add_dumps.enabled, "flare.middleware.add_dumps.maximum_number_of_collected_dumps", middleware.add_dumps.maximum_number_of_collected_dumps),
        ];
        for (enabled, key, capacity) in capacities {
            if enabled && capacity == 0 {
                return Err(IgnitionError::InvalidConfig(format!("{} must be greater than 0", key)));
            }
        }

        let threshold = self.ignition.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(IgnitionError::InvalidConfig(format!(
                "ignition.similarity_threshold must be between 0 and 1, got {}",
                threshold
            )));
        }

        if let Some(unknown) = self.ignition.recorders.iter().find(|r| !RECORDER_NAMES.contains(&r.as_str())) {
            return Err(IgnitionError::UnknownRecorder(unknown.clone()));
        }

        Ok(())
    }
}

impl TryFrom<config::Config> for IgnitionConfig {
    type Error = config::ConfigError;

    fn try_from(cfg: config::Config) -> std::result::Result<Self, Self::Error> {
        cfg.try_deserialize()
    }
}

/// Settings of the Flare client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlareConfig {
    /// Project API key; reports are only queued when it is set
    pub key: Option<String>,
    pub base_url: String,
    /// Deployment stage, e.g. `local` or `production`
    pub stage: String,
    /// Root of the application, used to flag application frames
    pub application_path: Option<String>,
    /// Send every report as soon as it is created
    pub send_reports_immediately: bool,
    /// Reports kept while waiting for a flush; the oldest are dropped first
    pub maximum_number_of_queued_reports: usize,
    /// Minimum log level reported as an error by the log capture layer
    pub report_level: String,
    pub collect_stacktrace: bool,
    pub middleware: MiddlewareConfig,
}

impl Default for FlareConfig {
    fn default() -> Self {
        Self {
            key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            stage: "local".to_string(),
            application_path: None,
            send_reports_immediately: false,
            maximum_number_of_queued_reports: DEFAULT_MAX_QUEUED_REPORTS,
            report_level: "error".to_string(),
            collect_stacktrace: true,
            middleware: MiddlewareConfig::default(),
        }
    }
}

impl FlareConfig {
    pub fn report_level(&self) -> Result<Level> {
        parse_report_level(&self.report_level)
    }
}

/// Maps a host log level name onto a `tracing` level
///
/// The syslog severities above `error` all map to [`Level::ERROR`] and
/// `notice` maps to [`Level::INFO`].
pub fn parse_report_level(level: &str) -> Result<Level> {
    match level.trim().to_ascii_lowercase().as_str() {
        "debug" => Ok(Level::DEBUG),
        "info" | "notice" => Ok(Level::INFO),
        "warning" | "warn" => Ok(Level::WARN),
        "error" | "critical" | "alert" | "emergency" => Ok(Level::ERROR),
        _ => Err(IgnitionError::InvalidLogLevel(level.to_string())),
    }
}

/// Report middleware, in the order it runs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MiddlewareConfig {
    pub add_logs: AddLogsConfig,
    pub add_queries: AddQueriesConfig,
    pub add_jobs: AddJobsConfig,
    pub add_dumps: AddDumpsConfig,
    pub censor_request_body_fields: CensorConfig,
    pub add_solutions: AddSolutionsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AddLogsConfig {
    pub enabled: bool,
    pub maximum_number_of_collected_logs: usize,
}

impl Default for AddLogsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            maximum_number_of_collected_logs: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AddQueriesConfig {
    pub enabled: bool,
    pub maximum_number_of_collected_queries: usize,
    pub report_query_bindings: bool,
}

impl Default for AddQueriesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            maximum_number_of_collected_queries: 200,
            report_query_bindings: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AddJobsConfig {
    pub enabled: bool,
    pub maximum_number_of_collected_jobs: usize,
    pub max_chained_job_reporting_depth: usize,
}

impl Default for AddJobsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            maximum_number_of_collected_jobs: 1,
            max_chained_job_reporting_depth: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AddDumpsConfig {
    pub enabled: bool,
    pub maximum_number_of_collected_dumps: usize,
}

impl Default for AddDumpsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            maximum_number_of_collected_dumps: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CensorConfig {
    pub enabled: bool,
    /// Context keys whose values are replaced before sending
    pub fields: Vec<String>,
}

impl Default for CensorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fields: vec!["password".to_string(), "password_confirmation".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AddSolutionsConfig {
    pub enabled: bool,
}

impl Default for AddSolutionsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Solution providers and recorders
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolutionsConfig {
    /// Built-in provider identifiers, in the order they are asked
    pub solution_providers: Vec<String>,
    pub ignored_solution_providers: Vec<String>,
    /// Recorders started on boot
    pub recorders: Vec<String>,
    pub similarity_threshold: f64,
}

impl Default for SolutionsConfig {
    fn default() -> Self {
        Self {
            solution_providers: BUILTIN_PROVIDERS.iter().map(|p| p.to_string()).collect(),
            ignored_solution_providers: Vec::new(),
            recorders: RECORDER_NAMES.iter().map(|r| r.to_string()).collect(),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl SolutionsConfig {
    pub fn ranker(&self) -> NameSimilarityRanker {
        NameSimilarityRanker::new(self.similarity_threshold)
    }

    pub fn records(&self, recorder: &str) -> bool {
        self.recorders.iter().any(|r| r == recorder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IgnitionConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.flare.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.flare.report_level().unwrap(), Level::ERROR);
        assert_eq!(config.flare.middleware.add_queries.maximum_number_of_collected_queries, 200);
        assert!(config.flare.middleware.add_queries.report_query_bindings);
        assert_eq!(config.flare.middleware.add_jobs.maximum_number_of_collected_jobs, 1);
        assert_eq!(config.flare.middleware.add_jobs.max_chained_job_reporting_depth, 5);
        assert_eq!(config.flare.middleware.censor_request_body_fields.fields, vec!["password", "password_confirmation"]);
        assert_eq!(config.ignition.solution_providers.len(), BUILTIN_PROVIDERS.len());
        assert_eq!(config.flare.maximum_number_of_queued_reports, DEFAULT_MAX_QUEUED_REPORTS);
        assert!(config.ignition.records("dumps"));
    }

    #[test]
    fn test_parse_report_level() {
        assert_eq!(parse_report_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_report_level("notice").unwrap(), Level::INFO);
        assert_eq!(parse_report_level("Warning").unwrap(), Level::WARN);
        assert_eq!(parse_report_level("warn").unwrap(), Level::WARN);
        assert_eq!(parse_report_level("critical").unwrap(), Level::ERROR);
        assert_eq!(parse_report_level("emergency").unwrap(), Level::ERROR);
        assert!(matches!(parse_report_level("loud"), Err(IgnitionError::InvalidLogLevel(l)) if l == "loud"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = IgnitionConfig::default();
        config.flare.report_level = "shouting".to_string();
        assert!(matches!(config.validate(), Err(IgnitionError::InvalidLogLevel(_))));

        let mut config = IgnitionConfig::default();
        config.flare.middleware.add_logs.maximum_number_of_collected_logs = 0;
        assert!(matches!(config.validate(), Err(IgnitionError::InvalidConfig(_))));

        // a disabled middleware is not checked
        config.flare.middleware.add_logs.enabled = false;
        assert!(config.validate().is_ok());

        let mut config = IgnitionConfig::default();
        config.flare.maximum_number_of_queued_reports = 0;
        assert!(matches!(config.validate(), Err(IgnitionError::InvalidConfig(_))));

        let mut config = IgnitionConfig::default();
        config.ignition.similarity_threshold = 1.5;
        assert!(matches!(config.validate(), Err(IgnitionError::InvalidConfig(_))));

        let mut config = IgnitionConfig::default();
        config.ignition.recorders.push("cache".to_string());
        assert!(matches!(config.validate(), Err(IgnitionError::UnknownRecorder(r)) if r == "cache"));
    }

    #[test]
    fn test_try_from_config_overrides_defaults() {
        let cfg = config::Config::builder()
            .set_override("flare.stage", "production")
            .unwrap()
            .set_override("flare.middleware.add_queries.report_query_bindings", false)
            .unwrap()
            .set_override("ignition.similarity_threshold", 0.8)
            .unwrap()
            .build()
            .unwrap();

        let config = IgnitionConfig::try_from(cfg).unwrap();
        assert_eq!(config.flare.stage, "production");
        assert!(!config.flare.middleware.add_queries.report_query_bindings);
        assert_eq!(config.flare.middleware.add_queries.maximum_number_of_collected_queries, 200);
        assert_eq!(config.ignition.ranker().threshold(), 0.8);
        assert_eq!(config.logging.level, "info");
    }
}
