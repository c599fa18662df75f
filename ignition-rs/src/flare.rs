//! # Flare Client
//!
//! Builds reports from captured errors, runs them through the middleware
//! pipeline and queues them for delivery. Delivery happens when the host
//! flushes the queue, usually at a unit-of-work boundary. The queue is
//! capped; when it is full the oldest report is dropped.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use metrics::counter;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::captured::{capture_stacktrace, CapturedError};
use crate::config::FlareConfig;
use crate::error::Result;
use crate::middleware::ReportMiddleware;
use crate::report::{Report, LOG_CLASS};
use crate::transport::{HttpTransport, ReportTransport};

/// Reports delivered during the current unit of work
#[derive(Debug, Default)]
pub struct SentReports {
    reports: Mutex<Vec<Report>>,
}

impl SentReports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, report: Report) {
        self.lock().push(report);
    }

    pub fn uuids(&self) -> Vec<Uuid> {
        self.lock().iter().map(|r| r.tracking_uuid).collect()
    }

    pub fn latest_uuid(&self) -> Option<Uuid> {
        self.lock().last().map(|r| r.tracking_uuid)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Report>> {
        self.reports.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The Flare reporting client
pub struct Flare {
    stage: String,
    application_path: Option<String>,
    collect_stacktrace: bool,
    middleware: Vec<Arc<dyn ReportMiddleware>>,
    transport: Option<Arc<dyn ReportTransport>>,
    queue: Mutex<VecDeque<Report>>,
    max_queued: usize,
    sent: Arc<SentReports>,
    send_immediately: AtomicBool,
}

impl std::fmt::Debug for Flare {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flare")
            .field("stage", &self.stage)
            .field("middleware", &self.middleware.iter().map(|m| m.name()).collect::<Vec<_>>())
            .field("has_transport", &self.transport.is_some())
            .field("queued", &self.queued())
            .finish()
    }
}

impl Flare {
    /// Creates a client; without a transport reports are built but never queued
    pub fn new(
        config: &FlareConfig,
        middleware: Vec<Arc<dyn ReportMiddleware>>,
        transport: Option<Arc<dyn ReportTransport>>,
    ) -> Self {
        Self {
            stage: config.stage.clone(),
            application_path: config.application_path.clone(),
            collect_stacktrace: config.collect_stacktrace,
            middleware,
            transport,
            queue: Mutex::new(VecDeque::new()),
            max_queued: config.maximum_number_of_queued_reports.max(1),
            sent: Arc::new(SentReports::new()),
            send_immediately: AtomicBool::new(config.send_reports_immediately),
        }
    }

    /// The HTTP transport for the configured API key, if one is set
    pub fn http_transport(config: &FlareConfig) -> Result<Option<Arc<dyn ReportTransport>>> {
        match config.key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => Ok(Some(Arc::new(HttpTransport::new(&config.base_url, key)?))),
            None => Ok(None),
        }
    }

    /// Builds, enriches and queues a report for the error
    pub fn report(&self, error: &CapturedError) -> Report {
        let mut report = Report::from_error(error);

        if self.collect_stacktrace && report.stacktrace.is_empty() {
            report.stacktrace = capture_stacktrace(self.application_path.as_deref().map(Path::new));
        }

        self.finish(error, report)
    }

    /// Builds, enriches and queues a report for a log message
    pub fn report_message<M, L>(&self, message: M, level: L, context: Map<String, Value>) -> Report
    where
        M: Into<String>,
        L: Into<String>,
    {
        let mut report = Report::from_message(message, level);
        if !context.is_empty() {
            report.group("context", Value::Object(context.clone()));
        }

        let mut error = CapturedError::new(LOG_CLASS, report.message.as_str());
        error.context = context;

        self.finish(&error, report)
    }

    fn finish(&self, error: &CapturedError, mut report: Report) -> Report {
        report.stage = self.stage.clone();
        report.application_path = self.application_path.clone();

        for middleware in &self.middleware {
            middleware.handle(error, &mut report);
        }

        counter!("ignition.reports.total", 1);
        tracing::debug!(
            tracking_uuid = %report.tracking_uuid,
            class = %report.exception_class,
            solutions = report.solutions.len(),
            "Report created"
        );

        if self.transport.is_some() {
            self.enqueue(report.clone());
        }

        report
    }

    /// Delivers every queued report and returns how many were accepted
    ///
    /// Delivery failures are logged and counted; the report is dropped.
    pub async fn send_queued_reports(&self) -> usize {
        let Some(transport) = &self.transport else {
            return 0;
        };

        let reports = std::mem::take(&mut *self.lock_queue());
        let mut delivered = 0;

        for report in reports {
            match transport.send(&report).await {
                Ok(()) => {
                    counter!("ignition.reports.sent", 1);
                    delivered += 1;
                    self.sent.add(report);
                }
                Err(e) => {
                    counter!("ignition.reports.failed", 1);
                    tracing::warn!(
                        tracking_uuid = %report.tracking_uuid,
                        error = %e,
                        transient = e.is_transient(),
                        "Failed to send report"
                    );
                }
            }
        }

        delivered
    }

    /// Makes every following report flush as soon as it is created
    pub fn send_reports_immediately(&self) -> &Self {
        self.send_immediately.store(true, Ordering::SeqCst);
        self
    }

    pub fn sends_reports_immediately(&self) -> bool {
        self.send_immediately.load(Ordering::SeqCst)
    }

    /// Drops queued reports
    pub fn reset(&self) {
        self.lock_queue().clear();
    }

    pub fn queued(&self) -> usize {
        self.lock_queue().len()
    }

    pub fn sent_reports(&self) -> Arc<SentReports> {
        Arc::clone(&self.sent)
    }

    fn enqueue(&self, report: Report) {
        let mut queue = self.lock_queue();
        while queue.len() >= self.max_queued {
            if let Some(dropped) = queue.pop_front() {
                counter!("ignition.reports.dropped", 1);
                tracing::warn!(
                    tracking_uuid = %dropped.tracking_uuid,
                    max_queued = self.max_queued,
                    "Report queue full, dropping oldest report"
                );
            }
        }
        queue.push_back(report);
    }

    fn lock_queue(&self) -> MutexGuard<'_, VecDeque<Report>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IgnitionError;
    use crate::transport::MockReportTransport;

    fn config() -> FlareConfig {
        FlareConfig {
            collect_stacktrace: false,
            stage: "testing".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_without_transport_nothing_is_queued() {
        let flare = Flare::new(&config(), Vec::new(), None);
        let report = flare.report(&CapturedError::new("Exception", "boom"));

        assert_eq!(report.stage, "testing");
        assert_eq!(flare.queued(), 0);
    }

    #[test]
    fn test_http_transport_requires_key() {
        assert!(Flare::http_transport(&config()).unwrap().is_none());

        let with_key = FlareConfig {
            key: Some("secret".to_string()),
            ..config()
        };
        assert!(Flare::http_transport(&with_key).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_send_queued_reports() {
        let mut transport = MockReportTransport::new();
        transport.expect_send().times(2).returning(|_| Ok(()));

        let flare = Flare::new(&config(), Vec::new(), Some(Arc::new(transport)));
        let first = flare.report(&CapturedError::new("Exception", "first"));
        let second = flare.report_message("second", "error", Map::new());
        assert_eq!(flare.queued(), 2);

        assert_eq!(flare.send_queued_reports().await, 2);
        assert_eq!(flare.queued(), 0);
        assert_eq!(flare.sent_reports().uuids(), vec![first.tracking_uuid, second.tracking_uuid]);
        assert_eq!(flare.sent_reports().latest_uuid(), Some(second.tracking_uuid));
    }

    #[tokio::test]
    async fn test_failed_send_is_not_propagated() {
        let mut transport = MockReportTransport::new();
        transport.expect_send().times(1).returning(|_| {
            Err(IgnitionError::Rejected {
                status: 500,
                body: "oops".to_string(),
            })
        });

        let flare = Flare::new(&config(), Vec::new(), Some(Arc::new(transport)));
        flare.report(&CapturedError::new("Exception", "boom"));

        assert_eq!(flare.send_queued_reports().await, 0);
        assert!(flare.sent_reports().is_empty());
        assert_eq!(flare.queued(), 0);
    }

    #[test]
    fn test_reset_drops_queue() {
        let flare = Flare::new(&config(), Vec::new(), Some(Arc::new(MockReportTransport::new())));
        flare.report(&CapturedError::new("Exception", "boom"));
        flare.reset();
        assert_eq!(flare.queued(), 0);
    }

    #[tokio::test]
    async fn test_full_queue_drops_oldest_report() {
        let mut transport = MockReportTransport::new();
        transport
            .expect_send()
            .times(2)
            .withf(|report: &Report| report.message != "first")
            .returning(|_| Ok(()));

        let config = FlareConfig {
            maximum_number_of_queued_reports: 2,
            ..config()
        };
        let flare = Flare::new(&config, Vec::new(), Some(Arc::new(transport)));
        for message in ["first", "second", "third"] {
            flare.report(&CapturedError::new("Exception", message));
        }
        assert_eq!(flare.queued(), 2);

        assert_eq!(flare.send_queued_reports().await, 2);
        assert_eq!(flare.queued(), 0);
    }

    #[test]
    fn test_send_reports_immediately_toggle() {
        let flare = Flare::new(&config(), Vec::new(), None);
        assert!(!flare.sends_reports_immediately());
        flare.send_reports_immediately();
        assert!(flare.sends_reports_immediately());
    }

    #[test]
    fn test_report_message_carries_level_and_context() {
        let flare = Flare::new(&config(), Vec::new(), None);
        let mut context = Map::new();
        context.insert("user_id".to_string(), Value::from(7));

        let report = flare.report_message("disk full", "critical", context);
        assert_eq!(report.exception_class, LOG_CLASS);
        assert_eq!(report.level.as_deref(), Some("critical"));
        assert_eq!(report.context["context"]["user_id"], 7);
    }
}
