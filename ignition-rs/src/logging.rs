//! # Structured Logging
//!
//! Installs the global `tracing` subscriber and provides [`CaptureLayer`],
//! which turns the host's log events into recorded log messages and, at or
//! above the report level, into Flare reports.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::{fmt as fmt_layer, EnvFilter, Layer, Registry};

use crate::error::{IgnitionError, Result};
use crate::flare::Flare;
use crate::recorders::LogRecorder;

// Flag to track if logging has been initialized
static LOGGING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Events from these targets are never captured, so reporting cannot feed itself
const OWN_TARGET_PREFIX: &str = "ignition::";

/// Configuration for the logging system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// The log level to use (trace, debug, info, warn, error) or a full filter directive
    pub level: String,
    /// The service name, used for the log file name
    pub service_name: String,
    /// Whether to output logs to a file
    pub file_output: bool,
    /// The directory to store log files in
    pub log_dir: Option<String>,
    /// Whether to use JSON formatting
    pub json_format: bool,
    /// Whether to include the event target
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            service_name: "ignition".to_string(),
            file_output: false,
            log_dir: None,
            json_format: false,
            with_target: true,
        }
    }
}

/// Initializes the global subscriber, optionally with a capture layer
///
/// `RUST_LOG` takes precedence over `config.level`. Calling this again
/// after a successful initialization does nothing.
pub fn init_logging(config: &LoggingConfig, capture: Option<CaptureLayer>) -> Result<()> {
    if LOGGING_INITIALIZED.load(Ordering::SeqCst) {
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let json_layer = config.json_format.then(|| {
        fmt_layer::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_target(config.with_target)
    });
    let text_layer = (!config.json_format).then(|| {
        fmt_layer::layer()
            .with_target(config.with_target)
            .with_thread_names(true)
    });

    let file_layer = match (config.file_output, &config.log_dir) {
        (true, Some(log_dir)) => {
            let appender = tracing_appender::rolling::daily(log_dir, format!("{}.log", config.service_name));
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);

            // the guard flushes on drop and must live as long as the subscriber
            Box::leak(Box::new(guard));

            Some(fmt_layer::layer().with_writer(non_blocking).with_ansi(false))
        }
        _ => None,
    };

    let subscriber = Registry::default()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(file_layer)
        .with(capture);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| IgnitionError::Logging(format!("Failed to set global subscriber: {}", e)))?;

    LOGGING_INITIALIZED.store(true, Ordering::SeqCst);

    tracing::info!(
        service = %config.service_name,
        level = %config.level,
        json = %config.json_format,
        "Structured logging initialized"
    );

    Ok(())
}

/// The host-facing name of a `tracing` level
pub fn level_name(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "error",
        Level::WARN => "warning",
        Level::INFO => "info",
        Level::DEBUG | Level::TRACE => "debug",
    }
}

/// A `tracing` layer recording log events and reporting severe ones
pub struct CaptureLayer {
    recorder: Arc<LogRecorder>,
    flare: Arc<Flare>,
    report_level: Level,
}

impl fmt::Debug for CaptureLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureLayer")
            .field("report_level", &self.report_level)
            .finish()
    }
}

impl CaptureLayer {
    pub fn new(recorder: Arc<LogRecorder>, flare: Arc<Flare>, report_level: Level) -> Self {
        Self {
            recorder,
            flare,
            report_level,
        }
    }

    fn report(&self, message: &str, level: &Level, fields: Map<String, Value>) {
        self.flare.report_message(message, level_name(level), fields);

        if !self.flare.sends_reports_immediately() {
            return;
        }
        // flushing is async; without a runtime the report waits for the next flush
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let flare = Arc::clone(&self.flare);
            handle.spawn(async move {
                flare.send_queued_reports().await;
            });
        }
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if metadata.target().starts_with(OWN_TARGET_PREFIX) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        let message = visitor.message.unwrap_or_default();
        let level = metadata.level();

        // lower levels are more severe
        if *level <= self.report_level {
            self.report(&message, level, visitor.fields.clone());
        }

        self.recorder.record_log(message, level_name(level), visitor.fields);
    }
}

/// Collects the message and the structured fields of an event
#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), Value::from(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(field.name().to_string(), Value::from(format!("{:?}", value)));
        }
    }
}
