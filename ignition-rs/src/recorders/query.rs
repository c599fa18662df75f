use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{delegate_recorder, BoundedRecorder, EventKind, RecordedEvent};

/// An executed database query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEvent {
    pub sql: String,
    /// `None` when binding reporting is disabled
    pub bindings: Option<Vec<Value>>,
    pub time_ms: f64,
    pub connection_name: String,
}

/// Records the most recent queries of a unit of work
#[derive(Debug)]
pub struct QueryRecorder {
    inner: BoundedRecorder<QueryEvent>,
    report_bindings: bool,
}

impl QueryRecorder {
    pub fn new(capacity: usize, report_bindings: bool) -> Self {
        Self {
            inner: BoundedRecorder::new(EventKind::Query, capacity),
            report_bindings,
        }
    }

    /// Records an executed query
    ///
    /// Bindings are discarded here, before they are stored, when binding
    /// reporting is off.
    pub fn record_query<S, C>(&self, sql: S, bindings: Vec<Value>, time_ms: f64, connection_name: C)
    where
        S: Into<String>,
        C: Into<String>,
    {
        self.inner.record(QueryEvent {
            sql: sql.into(),
            bindings: self.report_bindings.then_some(bindings),
            time_ms,
            connection_name: connection_name.into(),
        });
    }

    pub fn reports_bindings(&self) -> bool {
        self.report_bindings
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    pub fn all(&self) -> Vec<RecordedEvent<QueryEvent>> {
        self.inner.all()
    }

    /// Recorded queries, oldest first
    pub fn queries(&self) -> Vec<QueryEvent> {
        self.inner.payloads()
    }
}

delegate_recorder!(QueryRecorder, "queries");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorders::Recorder;
    use serde_json::json;

    #[test]
    fn test_records_bindings_when_enabled() {
        let recorder = QueryRecorder::new(10, true);
        recorder.start();
        recorder.record_query("select * from users where id = ?", vec![json!(1)], 1.5, "mysql");

        let queries = recorder.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].bindings, Some(vec![json!(1)]));
        assert_eq!(queries[0].connection_name, "mysql");
    }

    #[test]
    fn test_drops_bindings_when_disabled() {
        let recorder = QueryRecorder::new(10, false);
        recorder.start();
        recorder.record_query("select * from users where email = ?", vec![json!("a@b.c")], 0.4, "pgsql");

        assert_eq!(recorder.queries()[0].bindings, None);
    }

    #[test]
    fn test_is_bounded() {
        let recorder = QueryRecorder::new(2, true);
        recorder.start();
        for i in 0..5 {
            recorder.record_query(format!("select {}", i), Vec::new(), 0.1, "sqlite");
        }

        let sql: Vec<String> = recorder.queries().into_iter().map(|q| q.sql).collect();
        assert_eq!(sql, vec!["select 3", "select 4"]);
        assert_eq!(recorder.name(), "queries");
    }
}
