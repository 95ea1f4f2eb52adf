mod checks_table;
mod operations_table;

use std::collections::BTreeMap;
use std::time::Duration;

use tabled::settings::Style;
use tabled::Table;

use crate::report::in_memory_reporter::checks_table::CheckRow;
use crate::report::in_memory_reporter::operations_table::OperationRow;
use crate::report::{CheckTally, ReportCollector};
use crate::{CheckRecord, OperationRecord};

/// Latency and error figures for all operations sharing an operation id.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationSummary {
    pub operation_id: String,
    pub total_operations: usize,
    pub errors: usize,
    /// Latency figures only consider successful operations. `None` when every operation failed.
    pub avg_time: Option<Duration>,
    pub min_time: Option<Duration>,
    pub max_time: Option<Duration>,
    pub p95_time: Option<Duration>,
}

/// Keeps all operations and checks in memory and prints summary tables at the end of the run.
pub struct InMemoryReporter {
    operation_records: Vec<OperationRecord>,
    checks: CheckTally,
}

impl Default for InMemoryReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryReporter {
    pub fn new() -> Self {
        Self {
            operation_records: Vec::new(),
            checks: CheckTally::default(),
        }
    }

    /// Group the recorded operations by id, sorted by id.
    pub fn summarise_operations(&self) -> Vec<OperationSummary> {
        self.operation_records
            .iter()
            .fold(BTreeMap::<&str, Vec<&OperationRecord>>::new(), |mut acc, record| {
                acc.entry(record.operation_id()).or_default().push(record);
                acc
            })
            .into_iter()
            .map(|(operation_id, operations)| {
                let mut durations = operations
                    .iter()
                    .filter(|op| !op.is_error())
                    .filter_map(|op| op.duration())
                    .collect::<Vec<_>>();
                durations.sort();

                let avg_time = if durations.is_empty() {
                    None
                } else {
                    Some(durations.iter().sum::<Duration>() / durations.len() as u32)
                };

                OperationSummary {
                    operation_id: operation_id.to_string(),
                    total_operations: operations.len(),
                    errors: operations.iter().filter(|op| op.is_error()).count(),
                    avg_time,
                    min_time: durations.first().copied(),
                    max_time: durations.last().copied(),
                    p95_time: percentile(&durations, 95),
                }
            })
            .collect()
    }

    fn print_summary_of_operations(&self) {
        println!("\nSummary of operations");
        let rows = self
            .summarise_operations()
            .into_iter()
            .map(OperationRow::from)
            .collect::<Vec<_>>();

        let mut table = Table::new(rows);
        table.with(Style::modern());

        println!("{table}");
    }

    fn print_summary_of_checks(&self) {
        if self.checks.is_empty() {
            return;
        }

        println!("\nSummary of checks");
        let rows = self
            .checks
            .iter()
            .map(|(name, count)| CheckRow {
                check: name.to_string(),
                passed: count.passed,
                failed: count.failed,
                pass_rate: count.pass_rate() * 100.0,
            })
            .collect::<Vec<_>>();

        let mut table = Table::new(rows);
        table.with(Style::modern());

        println!("{table}");
    }
}

/// Nearest-rank percentile over already sorted values.
fn percentile(sorted: &[Duration], pct: usize) -> Option<Duration> {
    if sorted.is_empty() {
        return None;
    }

    let rank = (sorted.len() * pct).div_ceil(100).max(1);
    sorted.get(rank - 1).copied()
}

impl ReportCollector for InMemoryReporter {
    fn add_operation(&mut self, operation_record: &OperationRecord) {
        self.operation_records.push(operation_record.clone());
    }

    fn add_check(&mut self, check_record: &CheckRecord) {
        self.checks.record(check_record);
    }

    fn finalize(&mut self) {
        self.print_summary_of_operations();
        self.print_summary_of_checks();
    }
}
