//! # Reports
//!
//! The payload sent to Flare for one captured error or log message.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::captured::{CapturedError, StackFrame};
use crate::error::Result;
use crate::solutions::Solution;

/// Class name used for reports created from log messages
pub const LOG_CLASS: &str = "Log";

/// A structured error report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub tracking_uuid: Uuid,
    pub seen_at: DateTime<Utc>,
    pub exception_class: String,
    pub message: String,
    pub code: Option<String>,
    pub level: Option<String>,
    pub stage: String,
    pub application_path: Option<String>,
    pub language: String,
    pub language_version: Option<String>,
    pub notifier: String,
    #[serde(default)]
    pub stacktrace: Vec<StackFrame>,
    #[serde(default)]
    pub solutions: Vec<Solution>,
    /// Context groups (`queries`, `logs`, `job`, `dumps`, `context`, ...)
    #[serde(default)]
    pub context: BTreeMap<String, Value>,
}

impl Report {
    /// Creates a report for a captured error, before middleware ran
    pub fn from_error(error: &CapturedError) -> Self {
        let mut report = Self::empty(error.class.clone(), error.message().to_string());
        report.code = error.code.clone();
        report.stacktrace = error.stacktrace.clone();

        if !error.context.is_empty() {
            report.group("context", Value::Object(error.context.clone()));
        }
        if let Some(previous) = &error.previous {
            report.group("previous", previous_chain(previous));
        }

        report
    }

    /// Creates a report for a log message
    pub fn from_message<M: Into<String>, L: Into<String>>(message: M, level: L) -> Self {
        let mut report = Self::empty(LOG_CLASS.to_string(), message.into());
        report.level = Some(level.into());
        report
    }

    fn empty(exception_class: String, message: String) -> Self {
        Self {
            tracking_uuid: Uuid::new_v4(),
            seen_at: Utc::now(),
            exception_class,
            message,
            code: None,
            level: None,
            stage: String::new(),
            application_path: None,
            language: "Rust".to_string(),
            language_version: option_env!("CARGO_PKG_RUST_VERSION")
                .filter(|v| !v.is_empty())
                .map(str::to_string),
            notifier: format!("ignition-rs {}", env!("CARGO_PKG_VERSION")),
            stacktrace: Vec::new(),
            solutions: Vec::new(),
            context: BTreeMap::new(),
        }
    }

    /// Sets a context group, replacing any previous value
    pub fn group<K: Into<String>>(&mut self, name: K, value: Value) -> &mut Self {
        self.context.insert(name.into(), value);
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

fn previous_chain(error: &CapturedError) -> Value {
    let mut chain = Vec::new();
    let mut current = Some(error);
    while let Some(error) = current {
        chain.push(serde_json::json!({
            "class": error.class,
            "message": error.message(),
        }));
        current = error.previous.as_deref();
    }
    Value::Array(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_from_error() {
        let error = CapturedError::new("routing::RouteNotFoundException", "Route [home] not defined.")
            .code("404")
            .context("route", json!({ "name": "home" }))
            .previous(CapturedError::new("io::Error", "gone"));

        let report = Report::from_error(&error);
        assert_eq!(report.exception_class, "routing::RouteNotFoundException");
        assert_eq!(report.message, "Route [home] not defined.");
        assert_eq!(report.code.as_deref(), Some("404"));
        assert_eq!(report.context["context"]["route"]["name"], "home");
        assert_eq!(report.context["previous"][0]["class"], "io::Error");
        assert_eq!(report.language, "Rust");
    }

    #[test]
    fn test_report_from_message() {
        let report = Report::from_message("disk almost full", "warning");
        assert_eq!(report.exception_class, LOG_CLASS);
        assert_eq!(report.level.as_deref(), Some("warning"));
        assert!(report.context.is_empty());
    }

    #[test]
    fn test_report_json_uses_snake_case() {
        let json: Value = serde_json::from_str(&Report::from_message("m", "error").to_json().unwrap()).unwrap();
        assert!(json.get("tracking_uuid").is_some());
        assert!(json.get("exception_class").is_some());
        assert!(json.get("seen_at").is_some());
    }
}
