use itertools::Itertools;
use serde::{Deserialize, Serialize};
use sha3::Digest;
use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::Path;

/// Summary of a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    /// The unique run id
    ///
    /// Chosen by the runner unless given on the command line.
    pub run_id: String,
    /// The name of the scenario that was run
    pub scenario_name: String,
    /// The time the run started, as a Unix timestamp in seconds.
    pub started_at: i64,
    /// The duration that the run was configured with, in seconds
    ///
    /// Not set for soak runs.
    pub run_duration: Option<u64>,
    /// The number of virtual users started
    pub virtual_user_count: usize,
    /// The number of virtual users still running when the run ended
    ///
    /// Less than [RunSummary::virtual_user_count] when some users bailed or failed their setup.
    pub virtual_user_end_count: usize,
    /// The number of virtual users assigned to each behaviour.
    pub assigned_behaviours: HashMap<String, usize>,
    /// Total passing checks across all virtual users and check names.
    pub checks_passed: usize,
    /// Total failing checks across all virtual users and check names.
    pub checks_failed: usize,
    /// Environment variables captured for the run
    ///
    /// Only the variables the scenario asked to capture.
    pub env: HashMap<String, String>,
    /// The version of the load driver runner that was used for this run
    pub version: String,
}

impl RunSummary {
    pub fn new(
        run_id: String,
        scenario_name: String,
        started_at: i64,
        run_duration: Option<u64>,
        virtual_user_count: usize,
        assigned_behaviours: HashMap<String, usize>,
        version: String,
    ) -> Self {
        Self {
            run_id,
            scenario_name,
            started_at,
            run_duration,
            virtual_user_count,
            virtual_user_end_count: 0,
            assigned_behaviours,
            checks_passed: 0,
            checks_failed: 0,
            env: HashMap::with_capacity(0),
            version,
        }
    }

    pub fn set_virtual_user_end_count(&mut self, virtual_user_end_count: usize) {
        self.virtual_user_end_count = virtual_user_end_count;
    }

    pub fn set_check_totals(&mut self, passed: usize, failed: usize) {
        self.checks_passed = passed;
        self.checks_failed = failed;
    }

    pub fn add_env(&mut self, key: String, value: String) {
        self.env.insert(key, value);
    }

    /// Compute a fingerprint for this run summary
    ///
    /// The fingerprint identifies the configuration the scenario ran with, so that results of
    /// comparable runs can be grouped. It covers the
    ///     - Scenario name
    ///     - Run duration
    ///     - Virtual user count
    ///     - Assigned behaviours
    ///     - Captured environment variables
    ///     - Version
    ///
    /// The fingerprint is computed using [sha3::Sha3_256].
    pub fn fingerprint(&self) -> String {
        let mut hasher = sha3::Sha3_256::new();
        Digest::update(&mut hasher, self.scenario_name.as_bytes());
        if let Some(run_duration) = self.run_duration {
            Digest::update(&mut hasher, run_duration.to_le_bytes());
        }
        Digest::update(&mut hasher, (self.virtual_user_count as u64).to_le_bytes());
        self.assigned_behaviours
            .iter()
            .sorted_by_key(|(k, _)| k.to_owned())
            .for_each(|(k, v)| {
                Digest::update(&mut hasher, k.as_bytes());
                Digest::update(&mut hasher, (*v as u64).to_le_bytes());
            });
        self.env
            .iter()
            .sorted_by_key(|(k, _)| k.to_owned())
            .for_each(|(k, v)| {
                Digest::update(&mut hasher, k.as_bytes());
                Digest::update(&mut hasher, v.as_bytes());
            });
        Digest::update(&mut hasher, self.version.as_bytes());

        format!("{:x}", hasher.finalize())
    }
}

/// Append the run summary to a file
///
/// The summary is written as a single line of JSON followed by a newline. The recommended file
/// extension is `.jsonl`.
pub fn append_run_summary(run_summary: &RunSummary, path: &Path) -> anyhow::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)?;
    store_run_summary(run_summary, &mut file)?;
    file.write_all(b"\n")?;
    Ok(())
}

/// Serialize the run summary to a writer
pub fn store_run_summary<W: Write>(run_summary: &RunSummary, writer: &mut W) -> anyhow::Result<()> {
    serde_json::to_writer(writer, run_summary)?;
    Ok(())
}

/// Load run summaries from a file
///
/// The file should contain one JSON object per line, as produced by [append_run_summary]. Blank
/// lines are skipped.
pub fn load_summary_runs(path: &Path) -> anyhow::Result<Vec<RunSummary>> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let mut runs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let run: RunSummary = serde_json::from_str(&line)?;
        runs.push(run);
    }
    Ok(runs)
}
