use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{delegate_recorder, BoundedRecorder, EventKind, RecordedEvent};

/// A log record written during a unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub message: String,
    pub level: String,
    #[serde(default)]
    pub context: Map<String, Value>,
}

/// Records the most recent log messages of a unit of work
#[derive(Debug)]
pub struct LogRecorder {
    inner: BoundedRecorder<LogEvent>,
}

impl LogRecorder {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: BoundedRecorder::new(EventKind::Log, capacity),
        }
    }

    /// Records a log message
    ///
    /// Messages carrying an `exception` context entry are skipped: the error
    /// they describe is reported on its own.
    pub fn record_log<M, L>(&self, message: M, level: L, context: Map<String, Value>)
    where
        M: Into<String>,
        L: Into<String>,
    {
        if context.contains_key("exception") {
            return;
        }

        self.inner.record(LogEvent {
            message: message.into(),
            level: level.into(),
            context,
        });
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    pub fn all(&self) -> Vec<RecordedEvent<LogEvent>> {
        self.inner.all()
    }

    /// Recorded log messages, oldest first
    pub fn logs(&self) -> Vec<LogEvent> {
        self.inner.payloads()
    }
}

delegate_recorder!(LogRecorder, "logs");
