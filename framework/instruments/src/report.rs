mod in_memory_reporter;
mod jsonl_file_reporter;

use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::path::PathBuf;

use parking_lot::Mutex;

use crate::{CheckRecord, OperationRecord};

pub use in_memory_reporter::{InMemoryReporter, OperationSummary};
pub use jsonl_file_reporter::JsonlFileReporter;

/// Receives every operation and check recorded during a run.
pub trait ReportCollector {
    fn add_operation(&mut self, operation_record: &OperationRecord);

    fn add_check(&mut self, check_record: &CheckRecord);

    /// Called once, after every virtual user has stopped.
    fn finalize(&mut self);
}

/// Pass/fail counts for a single named check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckCount {
    pub passed: usize,
    pub failed: usize,
}

impl CheckCount {
    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    /// Fraction of passing checks, in `0.0..=1.0`. A check that never ran has a rate of `0.0`.
    pub fn pass_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.passed as f64 / self.total() as f64
        }
    }
}

/// Running pass/fail counts for every check name seen so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckTally {
    counts: BTreeMap<String, CheckCount>,
}

impl CheckTally {
    pub fn record(&mut self, check_record: &CheckRecord) {
        let count = self.counts.entry(check_record.name().to_string()).or_default();
        if check_record.passed() {
            count.passed += 1;
        } else {
            count.failed += 1;
        }
    }

    pub fn get(&self, name: &str) -> Option<CheckCount> {
        self.counts.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CheckCount)> {
        self.counts.iter().map(|(name, count)| (name.as_str(), count))
    }

    pub fn total_passed(&self) -> usize {
        self.counts.values().map(|c| c.passed).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.counts.values().map(|c| c.failed).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Fans recorded operations and checks out to the configured collectors.
///
/// Shared between all virtual users, so every method takes `&self`.
pub struct Reporter {
    collectors: Vec<Mutex<Box<dyn ReportCollector + Send>>>,
    tally: Mutex<CheckTally>,
}

impl Reporter {
    /// A reporter with no collectors. Checks are still tallied.
    pub fn noop() -> Self {
        Self::with_collectors(Vec::new())
    }

    pub fn with_collectors(collectors: Vec<Box<dyn ReportCollector + Send>>) -> Self {
        Self {
            collectors: collectors.into_iter().map(Mutex::new).collect(),
            tally: Mutex::new(CheckTally::default()),
        }
    }

    pub fn add_operation(&self, operation_record: &OperationRecord) {
        for collector in &self.collectors {
            collector.lock().add_operation(operation_record);
        }
    }

    pub fn add_check(&self, check_record: CheckRecord) {
        self.tally.lock().record(&check_record);
        for collector in &self.collectors {
            collector.lock().add_check(&check_record);
        }
    }

    /// A snapshot of the check counts recorded so far.
    pub fn check_tally(&self) -> CheckTally {
        self.tally.lock().clone()
    }

    pub fn finalize(&self) {
        for collector in &self.collectors {
            collector.lock().finalize();
        }
    }
}

impl Debug for Reporter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("collectors", &self.collectors.len())
            .field("tally", &*self.tally.lock())
            .finish()
    }
}

/// Choose which collectors a [Reporter] is built with.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    run_id: String,
    scenario_name: String,
    in_memory: bool,
    jsonl_dir: Option<PathBuf>,
}

impl ReportConfig {
    pub fn new(run_id: impl Into<String>, scenario_name: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            scenario_name: scenario_name.into(),
            in_memory: false,
            jsonl_dir: None,
        }
    }

    /// Print summary tables of operations and checks when the run finishes.
    pub fn enable_in_memory(mut self) -> Self {
        self.in_memory = true;
        self
    }

    /// Write every operation and check as a JSON line into a file under `dir`.
    pub fn enable_jsonl_file(mut self, dir: impl Into<PathBuf>) -> Self {
        self.jsonl_dir = Some(dir.into());
        self
    }

    pub fn init(self) -> anyhow::Result<Reporter> {
        let mut collectors: Vec<Box<dyn ReportCollector + Send>> = Vec::new();

        if self.in_memory {
            collectors.push(Box::new(InMemoryReporter::new()));
        }

        if let Some(dir) = &self.jsonl_dir {
            collectors.push(Box::new(JsonlFileReporter::create(
                dir,
                &self.scenario_name,
                &self.run_id,
            )?));
        }

        Ok(Reporter::with_collectors(collectors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Default)]
    struct Counting {
        operations: Arc<Mutex<Vec<(String, bool)>>>,
        checks: Arc<Mutex<usize>>,
        finalized: Arc<Mutex<bool>>,
    }

    impl ReportCollector for Counting {
        fn add_operation(&mut self, operation_record: &OperationRecord) {
            self.operations.lock().push((
                operation_record.operation_id().to_string(),
                operation_record.is_error(),
            ));
        }

        fn add_check(&mut self, _check_record: &CheckRecord) {
            *self.checks.lock() += 1;
        }

        fn finalize(&mut self) {
            *self.finalized.lock() = true;
        }
    }

    #[test]
    fn tally_counts_per_check_name() {
        let reporter = Reporter::noop();
        reporter.add_check(CheckRecord::new("hello is 200", true));
        reporter.add_check(CheckRecord::new("hello is 200", true));
        reporter.add_check(CheckRecord::new("slow is 200", false));

        let tally = reporter.check_tally();
        assert_eq!(
            Some(CheckCount {
                passed: 2,
                failed: 0
            }),
            tally.get("hello is 200")
        );
        assert_eq!(
            Some(CheckCount {
                passed: 0,
                failed: 1
            }),
            tally.get("slow is 200")
        );
        assert_eq!(2, tally.total_passed());
        assert_eq!(1, tally.total_failed());
        assert_eq!(None, tally.get("never ran"));
    }

    #[test]
    fn pass_rate_of_unused_check_is_zero() {
        assert_eq!(0.0, CheckCount::default().pass_rate());
        assert_eq!(
            0.75,
            CheckCount {
                passed: 3,
                failed: 1
            }
            .pass_rate()
        );
    }

    #[test]
    fn records_reach_every_collector() {
        let first = Counting::default();
        let second = Counting::default();
        let first_ops = first.operations.clone();
        let second_checks = second.checks.clone();
        let second_finalized = second.finalized.clone();

        let reporter = Reporter::with_collectors(vec![
            Box::new(first) as Box<dyn ReportCollector + Send>,
            Box::new(second),
        ]);
        reporter.add_operation(&OperationRecord::finished_with(
            "GET /",
            Duration::from_millis(3),
            false,
        ));
        reporter.add_check(CheckRecord::new("root is 200", true));
        reporter.finalize();

        assert_eq!(1, first_ops.lock().len());
        assert_eq!(1, *second_checks.lock());
        assert!(*second_finalized.lock());
    }

    #[test]
    fn report_operation_marks_errors() {
        let collector = Counting::default();
        let operations = collector.operations.clone();
        let reporter =
            Reporter::with_collectors(vec![Box::new(collector) as Box<dyn ReportCollector + Send>]);

        let ok: Result<(), ()> = Ok(());
        crate::report_operation(&reporter, OperationRecord::new("GET /ok"), &ok);
        let err: Result<(), ()> = Err(());
        crate::report_operation(&reporter, OperationRecord::new("GET /err"), &err);

        assert_eq!(
            vec![("GET /ok".to_string(), false), ("GET /err".to_string(), true)],
            *operations.lock()
        );
    }
}
