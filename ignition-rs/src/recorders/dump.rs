use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use super::{delegate_recorder, BoundedRecorder, EventKind, RecordedEvent};

/// A value dumped for debugging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DumpEvent {
    /// Pretty-printed `Debug` output of the value
    pub dump: String,
    pub file: Option<String>,
    pub line_number: Option<u32>,
}

/// Records values dumped during a unit of work
#[derive(Debug)]
pub struct DumpRecorder {
    inner: BoundedRecorder<DumpEvent>,
}

impl DumpRecorder {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: BoundedRecorder::new(EventKind::Dump, capacity),
        }
    }

    /// Records the pretty-printed form of `value`
    pub fn record_dump<T: Debug + ?Sized>(&self, value: &T, file: Option<&str>, line_number: Option<u32>) {
        self.inner.record(DumpEvent {
            dump: format!("{:#?}", value),
            file: file.map(str::to_string),
            line_number,
        });
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    pub fn all(&self) -> Vec<RecordedEvent<DumpEvent>> {
        self.inner.all()
    }

    pub fn dumps(&self) -> Vec<DumpEvent> {
        self.inner.payloads()
    }
}

delegate_recorder!(DumpRecorder, "dumps");

/// Dumps a value into a [`DumpRecorder`], keeping the call site
///
/// ```ignore
/// ignition::dump!(ignition.recorders().dumps, &order);
/// ```
#[macro_export]
macro_rules! dump {
    ($recorder:expr, $value:expr) => {
        $recorder.record_dump($value, Some(file!()), Some(line!()))
    };
}
