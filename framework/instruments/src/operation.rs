use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::report::Reporter;

/// A single timed call made by a virtual user.
///
/// Create the record right before the call starts, then hand it to [report_operation] with the
/// call's result. The elapsed time is measured between the two.
#[derive(Debug, Clone)]
pub struct OperationRecord {
    operation_id: String,
    started: Instant,
    started_at_ms: i64,
    elapsed: Option<Duration>,
    is_error: bool,
    attributes: BTreeMap<String, String>,
}

impl OperationRecord {
    pub fn new(operation_id: impl Into<String>) -> Self {
        Self {
            operation_id: operation_id.into(),
            started: Instant::now(),
            started_at_ms: chrono::Utc::now().timestamp_millis(),
            elapsed: None,
            is_error: false,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_attribute(key, value);
        self
    }

    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Unix timestamp, in milliseconds, of when the operation started.
    pub fn started_at_ms(&self) -> i64 {
        self.started_at_ms
    }

    /// How long the operation took. `None` until the record has been finished.
    pub fn duration(&self) -> Option<Duration> {
        self.elapsed
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub(crate) fn finish(&mut self, is_error: bool) {
        self.elapsed = Some(self.started.elapsed());
        self.is_error = is_error;
    }

    #[cfg(test)]
    pub(crate) fn finished_with(operation_id: &str, elapsed: Duration, is_error: bool) -> Self {
        let mut record = Self::new(operation_id);
        record.elapsed = Some(elapsed);
        record.is_error = is_error;
        record
    }
}

/// Stop the clock on an operation and pass it to the reporter.
///
/// The operation counts as an error when `response` is an `Err`.
pub fn report_operation<T, E>(
    reporter: &Reporter,
    mut record: OperationRecord,
    response: &Result<T, E>,
) {
    record.finish(response.is_err());
    log::trace!(
        "Operation {} finished in {:?}, error: {}",
        record.operation_id,
        record.elapsed,
        record.is_error
    );
    reporter.add_operation(&record);
}
