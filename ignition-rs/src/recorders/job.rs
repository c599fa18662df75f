use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{delegate_recorder, BoundedRecorder, EventKind, RecordedEvent};

/// A queued job that was being processed
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobEvent {
    pub name: String,
    pub connection: String,
    pub queue: String,
    pub attempts: u32,
    #[serde(default)]
    pub properties: Map<String, Value>,
    /// Jobs chained to run after this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chained: Vec<JobEvent>,
}

impl JobEvent {
    pub fn new<N, C, Q>(name: N, connection: C, queue: Q) -> Self
    where
        N: Into<String>,
        C: Into<String>,
        Q: Into<String>,
    {
        Self {
            name: name.into(),
            connection: connection.into(),
            queue: queue.into(),
            ..Default::default()
        }
    }

    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn property<K: Into<String>>(mut self, key: K, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn chain(mut self, job: JobEvent) -> Self {
        self.chained.push(job);
        self
    }

    /// Cuts the chain so that at most `depth` levels of chained jobs remain
    fn truncate_chain(&mut self, depth: usize) {
        if depth == 0 {
            self.chained.clear();
            return;
        }

        for job in &mut self.chained {
            job.truncate_chain(depth - 1);
        }
    }
}

/// Records the job being processed when an error occurs
#[derive(Debug)]
pub struct JobRecorder {
    inner: BoundedRecorder<JobEvent>,
    max_chain_depth: usize,
}

impl JobRecorder {
    pub fn new(capacity: usize, max_chain_depth: usize) -> Self {
        Self {
            inner: BoundedRecorder::new(EventKind::Job, capacity),
            max_chain_depth,
        }
    }

    pub fn record_job(&self, mut job: JobEvent) {
        job.truncate_chain(self.max_chain_depth);
        self.inner.record(job);
    }

    pub fn max_chain_depth(&self) -> usize {
        self.max_chain_depth
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    pub fn all(&self) -> Vec<RecordedEvent<JobEvent>> {
        self.inner.all()
    }

    pub fn jobs(&self) -> Vec<JobEvent> {
        self.inner.payloads()
    }

    /// The most recently recorded job
    pub fn current(&self) -> Option<JobEvent> {
        self.inner.payloads().pop()
    }
}

delegate_recorder!(JobRecorder, "jobs");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorders::Recorder;
    use serde_json::json;

    fn chain_depth(job: &JobEvent) -> usize {
        job.chained.iter().map(|j| 1 + chain_depth(j)).max().unwrap_or(0)
    }

    #[test]
    fn test_keeps_latest_job() {
        let recorder = JobRecorder::new(1, 5);
        recorder.start();
        recorder.record_job(JobEvent::new("SendInvoice", "redis", "default"));
        recorder.record_job(JobEvent::new("ProcessPodcast", "redis", "media").attempts(2));

        let current = recorder.current().unwrap();
        assert_eq!(current.name, "ProcessPodcast");
        assert_eq!(current.attempts, 2);
        assert_eq!(recorder.len(), 1);
    }

    #[test]
    fn test_truncates_chained_jobs() {
        let recorder = JobRecorder::new(1, 2);
        recorder.start();

        let job = JobEvent::new("A", "sync", "default").chain(
            JobEvent::new("B", "sync", "default")
                .chain(JobEvent::new("C", "sync", "default").chain(JobEvent::new("D", "sync", "default"))),
        );
        assert_eq!(chain_depth(&job), 3);

        recorder.record_job(job);
        assert_eq!(chain_depth(&recorder.current().unwrap()), 2);
    }

    #[test]
    fn test_properties_are_kept() {
        let recorder = JobRecorder::new(1, 0);
        recorder.start();
        recorder.record_job(
            JobEvent::new("Export", "sqs", "exports")
                .property("user_id", json!(12))
                .chain(JobEvent::new("Notify", "sqs", "exports")),
        );

        let current = recorder.current().unwrap();
        assert_eq!(current.properties["user_id"], json!(12));
        assert!(current.chained.is_empty());
    }
}
