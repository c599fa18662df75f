//! # Recorders
//!
//! Bounded buffers of recent framework events (queries, logs, jobs, dumps)
//! that are attached to a report when an error is captured.
//!
//! A recorder drops events until it is started and keeps at most its
//! capacity, evicting the oldest event first. Long-lived workers reuse the
//! same recorders across units of work, so the orchestrator resets them at
//! every boundary.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::MiddlewareConfig;

mod dump;
mod job;
mod log;
mod query;

pub use dump::{DumpEvent, DumpRecorder};
pub use job::{JobEvent, JobRecorder};
pub use log::{LogEvent, LogRecorder};
pub use query::{QueryEvent, QueryRecorder};

/// The kind of event held by a recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Query,
    Log,
    Job,
    Dump,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Query => write!(f, "query"),
            EventKind::Log => write!(f, "log"),
            EventKind::Job => write!(f, "job"),
            EventKind::Dump => write!(f, "dump"),
        }
    }
}

/// A single recorded event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent<P> {
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    pub payload: P,
}

impl<P> RecordedEvent<P> {
    /// Creates an event stamped with the current time
    pub fn now(kind: EventKind, payload: P) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// Lifecycle shared by every recorder, used by the orchestrator
pub trait Recorder: Send + Sync {
    /// Configuration name of the recorder (`queries`, `logs`, `jobs`, `dumps`)
    fn name(&self) -> &'static str;

    /// Begins accepting events
    fn start(&self);

    /// Stops accepting events; recorded events are kept
    fn stop(&self);

    /// Drops every recorded event
    fn reset(&self);

    /// Whether events are currently accepted
    fn is_active(&self) -> bool;

    /// Number of events currently held
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Capped FIFO buffer of recorded events
///
/// Every operation is infallible. A poisoned lock is recovered rather than
/// propagated, because recording runs on hot paths next to the code that
/// is failing.
#[derive(Debug)]
pub struct BoundedRecorder<P> {
    kind: EventKind,
    capacity: usize,
    active: AtomicBool,
    events: Mutex<VecDeque<RecordedEvent<P>>>,
}

impl<P: Clone> BoundedRecorder<P> {
    /// Creates an inactive recorder holding at most `capacity` events
    ///
    /// A capacity of zero keeps nothing; configuration validation rejects it
    /// before a recorder is wired.
    pub fn new(kind: EventKind, capacity: usize) -> Self {
        Self {
            kind,
            capacity,
            active: AtomicBool::new(false),
            events: Mutex::new(VecDeque::with_capacity(capacity.min(256))),
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records a payload stamped with the current time
    pub fn record(&self, payload: P) {
        self.record_event(RecordedEvent::now(self.kind, payload));
    }

    /// Records a prepared event; dropped silently while inactive
    pub fn record_event(&self, event: RecordedEvent<P>) {
        if !self.is_active() {
            return;
        }

        let mut events = self.lock();
        events.push_back(event);

        while events.len() > self.capacity {
            events.pop_front();
        }
    }

    pub fn start(&self) {
        self.active.store(true, Ordering::SeqCst);
    }

    pub fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.lock().clear();
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Snapshot of the recorded events, oldest first
    pub fn all(&self) -> Vec<RecordedEvent<P>> {
        self.lock().iter().cloned().collect()
    }

    /// Snapshot of the recorded payloads, oldest first
    pub fn payloads(&self) -> Vec<P> {
        self.lock().iter().map(|event| event.payload.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<RecordedEvent<P>>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The recorder set of one worker context
#[derive(Debug, Clone)]
pub struct Recorders {
    pub queries: Arc<QueryRecorder>,
    pub logs: Arc<LogRecorder>,
    pub jobs: Arc<JobRecorder>,
    pub dumps: Arc<DumpRecorder>,
}

impl Recorders {
    /// Creates inactive recorders sized by the middleware settings
    pub fn from_config(config: &MiddlewareConfig) -> Self {
        Self {
            queries: Arc::new(QueryRecorder::new(
                config.add_queries.maximum_number_of_collected_queries,
                config.add_queries.report_query_bindings,
            )),
            logs: Arc::new(LogRecorder::new(config.add_logs.maximum_number_of_collected_logs)),
            jobs: Arc::new(JobRecorder::new(
                config.add_jobs.maximum_number_of_collected_jobs,
                config.add_jobs.max_chained_job_reporting_depth,
            )),
            dumps: Arc::new(DumpRecorder::new(config.add_dumps.maximum_number_of_collected_dumps)),
        }
    }

    /// Looks a recorder up by its configuration name
    pub fn iter(&self) -> [&dyn Recorder; 4] {
        [&*self.dumps, &*self.jobs, &*self.logs, &*self.queries]
    }
}

/// Implements [`Recorder`] for a typed recorder wrapping `self.inner`
macro_rules! delegate_recorder {
    ($ty:ty, $name:literal) => {
        impl $crate::recorders::Recorder for $ty {
            fn name(&self) -> &'static str {
                $name
            }

            fn start(&self) {
                self.inner.start();
            }

            fn stop(&self) {
                self.inner.stop();
            }

            fn reset(&self) {
                self.inner.reset();
            }

            fn is_active(&self) -> bool {
                self.inner.is_active()
            }

            fn len(&self) -> usize {
                self.inner.len()
            }
        }
    };
}

pub(crate) use delegate_recorder;
