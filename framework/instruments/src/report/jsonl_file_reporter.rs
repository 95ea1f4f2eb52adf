use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;

use crate::report::ReportCollector;
use crate::{CheckRecord, OperationRecord};

/// Writes one JSON object per line for every operation and check.
///
/// The file is named `<scenario>-<run_id>.jsonl` and lives in the directory given to
/// [JsonlFileReporter::create].
pub struct JsonlFileReporter {
    path: PathBuf,
    writer: BufWriter<File>,
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ReportLine<'a> {
    Operation {
        operation_id: &'a str,
        started_at_ms: i64,
        duration_us: Option<u64>,
        is_error: bool,
        attributes: &'a BTreeMap<String, String>,
    },
    Check {
        name: &'a str,
        passed: bool,
        virtual_user: Option<&'a str>,
        timestamp_ms: i64,
    },
}

impl JsonlFileReporter {
    pub fn create(dir: &Path, scenario_name: &str, run_id: &str) -> anyhow::Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create reports directory {dir:?}"))?;

        let path = dir.join(format!("{scenario_name}-{run_id}.jsonl"));
        let file = File::create(&path)
            .with_context(|| format!("Failed to create report file {path:?}"))?;
        log::info!("Writing report to {path:?}");

        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    fn write_line(&mut self, line: &ReportLine) {
        let result = serde_json::to_writer(&mut self.writer, line)
            .map_err(std::io::Error::from)
            .and_then(|_| self.writer.write_all(b"\n"));

        if let Err(e) = result {
            log::warn!("Failed to write report line to {:?}: {e:?}", self.path);
        }
    }
}

impl ReportCollector for JsonlFileReporter {
    fn add_operation(&mut self, operation_record: &OperationRecord) {
        self.write_line(&ReportLine::Operation {
            operation_id: operation_record.operation_id(),
            started_at_ms: operation_record.started_at_ms(),
            duration_us: operation_record
                .duration()
                .map(|d| d.as_micros() as u64),
            is_error: operation_record.is_error(),
            attributes: operation_record.attributes(),
        });
    }

    fn add_check(&mut self, check_record: &CheckRecord) {
        self.write_line(&ReportLine::Check {
            name: check_record.name(),
            passed: check_record.passed(),
            virtual_user: check_record.virtual_user(),
            timestamp_ms: check_record.timestamp_ms(),
        });
    }

    fn finalize(&mut self) {
        if let Err(e) = self.writer.flush() {
            log::error!("Failed to flush report file {:?}: {e:?}", self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn writes_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut reporter =
            JsonlFileReporter::create(&dir.path().join("reports"), "gateway", "run-1").unwrap();

        reporter.add_operation(
            &OperationRecord::finished_with("GET /api/service-b/hello", Duration::from_millis(4), false)
                .with_attribute("status", "200"),
        );
        reporter.add_check(
            &CheckRecord::new("service-b hello status is 200", true).with_virtual_user("vu-0"),
        );
        reporter.finalize();

        let content =
            std::fs::read_to_string(dir.path().join("reports").join("gateway-run-1.jsonl")).unwrap();
        let lines = content
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap())
            .collect::<Vec<_>>();

        assert_eq!(2, lines.len());
        assert_eq!("operation", lines[0]["kind"]);
        assert_eq!("GET /api/service-b/hello", lines[0]["operation_id"]);
        assert_eq!(4000, lines[0]["duration_us"]);
        assert_eq!("200", lines[0]["attributes"]["status"]);
        assert_eq!("check", lines[1]["kind"]);
        assert_eq!(true, lines[1]["passed"]);
        assert_eq!("vu-0", lines[1]["virtual_user"]);
    }
}
