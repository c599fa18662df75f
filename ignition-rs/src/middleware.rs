//! # Report Middleware
//!
//! Steps that enrich or scrub a [`Report`] before it is queued. The
//! pipeline is built once from [`MiddlewareConfig`] and runs in a fixed
//! order: logs, queries, jobs, dumps, censoring, solutions.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::captured::CapturedError;
use crate::config::MiddlewareConfig;
use crate::recorders::{DumpRecorder, JobRecorder, LogRecorder, QueryRecorder, Recorders};
use crate::report::Report;
use crate::sanitization::{censor_fields, sanitize_message};
use crate::solutions::SolutionProviderRepository;

/// A step of the report pipeline
pub trait ReportMiddleware: Send + Sync {
    fn name(&self) -> &'static str;

    fn handle(&self, error: &CapturedError, report: &mut Report);
}

/// Builds the enabled middleware in pipeline order
pub fn pipeline(
    config: &MiddlewareConfig,
    recorders: &Recorders,
    repository: Arc<SolutionProviderRepository>,
) -> Vec<Arc<dyn ReportMiddleware>> {
    let mut middleware: Vec<Arc<dyn ReportMiddleware>> = Vec::new();

    if config.add_logs.enabled {
        middleware.push(Arc::new(AddLogs::new(Arc::clone(&recorders.logs))));
    }
    if config.add_queries.enabled {
        middleware.push(Arc::new(AddQueries::new(Arc::clone(&recorders.queries))));
    }
    if config.add_jobs.enabled {
        middleware.push(Arc::new(AddJobs::new(Arc::clone(&recorders.jobs))));
    }
    if config.add_dumps.enabled {
        middleware.push(Arc::new(AddDumps::new(Arc::clone(&recorders.dumps))));
    }
    if config.censor_request_body_fields.enabled {
        middleware.push(Arc::new(CensorRequestBodyFields::new(
            config.censor_request_body_fields.fields.clone(),
        )));
    }
    if config.add_solutions.enabled {
        middleware.push(Arc::new(AddSolutions::new(repository)));
    }

    middleware
}

/// Attaches recorded log messages as the `logs` group
pub struct AddLogs {
    recorder: Arc<LogRecorder>,
}

impl AddLogs {
    pub fn new(recorder: Arc<LogRecorder>) -> Self {
        Self { recorder }
    }
}

impl ReportMiddleware for AddLogs {
    fn name(&self) -> &'static str {
        "add_logs"
    }

    fn handle(&self, _error: &CapturedError, report: &mut Report) {
        let logs: Vec<Value> = self
            .recorder
            .all()
            .into_iter()
            .map(|event| {
                json!({
                    "message": event.payload.message,
                    "level": event.payload.level,
                    "context": event.payload.context,
                    "time": event.timestamp,
                })
            })
            .collect();
        report.group("logs", Value::Array(logs));
    }
}

/// Attaches recorded queries as the `queries` group
pub struct AddQueries {
    recorder: Arc<QueryRecorder>,
}

impl AddQueries {
    pub fn new(recorder: Arc<QueryRecorder>) -> Self {
        Self { recorder }
    }
}

impl ReportMiddleware for AddQueries {
    fn name(&self) -> &'static str {
        "add_queries"
    }

    fn handle(&self, _error: &CapturedError, report: &mut Report) {
        let queries: Vec<Value> = self
            .recorder
            .all()
            .into_iter()
            .map(|event| {
                json!({
                    "sql": event.payload.sql,
                    "bindings": event.payload.bindings,
                    "time": event.payload.time_ms,
                    "connection_name": event.payload.connection_name,
                    "microtime": event.timestamp.timestamp_micros(),
                })
            })
            .collect();
        report.group("queries", Value::Array(queries));
    }
}

/// Attaches the job being processed as the `job` group
pub struct AddJobs {
    recorder: Arc<JobRecorder>,
}

impl AddJobs {
    pub fn new(recorder: Arc<JobRecorder>) -> Self {
        Self { recorder }
    }
}

impl ReportMiddleware for AddJobs {
    fn name(&self) -> &'static str {
        "add_jobs"
    }

    fn handle(&self, _error: &CapturedError, report: &mut Report) {
        if let Some(job) = self.recorder.current() {
            if let Ok(job) = serde_json::to_value(job) {
                report.group("job", job);
            }
        }
    }
}

/// Attaches dumped values as the `dumps` group
pub struct AddDumps {
    recorder: Arc<DumpRecorder>,
}

impl AddDumps {
    pub fn new(recorder: Arc<DumpRecorder>) -> Self {
        Self { recorder }
    }
}

impl ReportMiddleware for AddDumps {
    fn name(&self) -> &'static str {
        "add_dumps"
    }

    fn handle(&self, _error: &CapturedError, report: &mut Report) {
        if let Ok(dumps) = serde_json::to_value(self.recorder.dumps()) {
            report.group("dumps", dumps);
        }
    }
}

/// Replaces configured fields anywhere in the context and redacts
/// credentials from the message
pub struct CensorRequestBodyFields {
    fields: Vec<String>,
}

impl CensorRequestBodyFields {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }
}

impl ReportMiddleware for CensorRequestBodyFields {
    fn name(&self) -> &'static str {
        "censor_request_body_fields"
    }

    fn handle(&self, _error: &CapturedError, report: &mut Report) {
        let censored: usize = report
            .context
            .values_mut()
            .map(|group| censor_fields(group, &self.fields))
            .sum();
        if censored > 0 {
            tracing::debug!(censored, "Censored report fields");
        }

        report.message = sanitize_message(&report.message);
    }
}

/// Attaches the solutions found for the error
pub struct AddSolutions {
    repository: Arc<SolutionProviderRepository>,
}

impl AddSolutions {
    pub fn new(repository: Arc<SolutionProviderRepository>) -> Self {
        Self { repository }
    }
}

impl ReportMiddleware for AddSolutions {
    fn name(&self) -> &'static str {
        "add_solutions"
    }

    fn handle(&self, error: &CapturedError, report: &mut Report) {
        report.solutions = self.repository.solutions_for(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorders::{JobEvent, Recorder};
    use crate::solutions::providers::MissingMixManifestSolutionProvider;
    use serde_json::Map;

    fn started_recorders() -> Recorders {
        let recorders = Recorders::from_config(&MiddlewareConfig::default());
        for recorder in recorders.iter() {
            recorder.start();
        }
        recorders
    }

    #[test]
    fn test_pipeline_order_and_disabled_middleware() {
        let recorders = started_recorders();
        let repository = Arc::new(SolutionProviderRepository::new());

        let names: Vec<_> = pipeline(&MiddlewareConfig::default(), &recorders, Arc::clone(&repository))
            .iter()
            .map(|m| m.name())
            .collect();
        assert_eq!(
            names,
            vec!["add_logs", "add_queries", "add_jobs", "add_dumps", "censor_request_body_fields", "add_solutions"]
        );

        let mut config = MiddlewareConfig::default();
        config.add_dumps.enabled = false;
        config.censor_request_body_fields.enabled = false;
        let names: Vec<_> = pipeline(&config, &recorders, repository).iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["add_logs", "add_queries", "add_jobs", "add_solutions"]);
    }

    #[test]
    fn test_recorded_events_become_groups() {
        let recorders = started_recorders();
        recorders.queries.record_query("select * from users where id = ?", vec![json!(1)], 1.5, "mysql");
        recorders.logs.record_log("user logged in", "info", Map::new());
        recorders.jobs.record_job(JobEvent::new("SendInvoice", "redis", "default"));
        recorders.dumps.record_dump(&vec![1, 2], None, None);

        let error = CapturedError::new("Exception", "boom");
        let mut report = Report::from_error(&error);
        for middleware in pipeline(&MiddlewareConfig::default(), &recorders, Arc::new(SolutionProviderRepository::new())) {
            middleware.handle(&error, &mut report);
        }

        assert_eq!(report.context["queries"][0]["sql"], "select * from users where id = ?");
        assert_eq!(report.context["queries"][0]["bindings"], json!([1]));
        assert_eq!(report.context["logs"][0]["message"], "user logged in");
        assert_eq!(report.context["job"]["name"], "SendInvoice");
        assert_eq!(report.context["dumps"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_censor_replaces_configured_fields() {
        let error = CapturedError::new("Exception", "login failed with token=abc123")
            .context("request", json!({ "body": { "email": "a@b.c", "password": "hunter2" } }));
        let mut report = Report::from_error(&error);

        CensorRequestBodyFields::new(vec!["password".to_string()]).handle(&error, &mut report);

        assert_eq!(report.context["context"]["request"]["body"]["password"], "<CENSORED>");
        assert_eq!(report.context["context"]["request"]["body"]["email"], "a@b.c");
        assert_eq!(report.message, "login failed with token=[REDACTED]");
    }

    #[test]
    fn test_add_solutions() {
        let mut repository = SolutionProviderRepository::new();
        repository.register(Arc::new(MissingMixManifestSolutionProvider));

        let error = CapturedError::new("Exception", "Mix manifest not found at: /public/mix-manifest.json");
        let mut report = Report::from_error(&error);
        AddSolutions::new(Arc::new(repository)).handle(&error, &mut report);

        assert_eq!(report.solutions.len(), 1);
        assert_eq!(report.solutions[0].title, "Missing Mix Manifest File");
    }
}
