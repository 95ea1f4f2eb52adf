use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReporterOpt {
    /// Print summary tables of operations and checks when the run ends.
    #[default]
    InMemory,
    /// Write every operation and check to a JSON-lines file under `--reports-dir`.
    JsonlFile,
    /// Record nothing beyond the check totals kept for the run summary.
    Noop,
}

#[derive(Parser, Debug, Clone)]
#[command(about, long_about = None)]
pub struct ScenarioCli {
    /// The base URL of the service under test, for example `http://localhost:8080`.
    ///
    /// Request paths are appended to this value as-is.
    #[clap(long)]
    pub base_url: Option<String>,

    /// The number of virtual users to run.
    ///
    /// Defaults to the scenario's own default, or the number of users needed by `--behaviour`.
    #[clap(long, visible_alias = "vus")]
    pub virtual_users: Option<usize>,

    /// Assign a behaviour to a number of virtual users. Specify the behaviour and number of users
    /// to assign it to in the format `behaviour:count`. For example `--behaviour=canary:1`.
    ///
    /// Specifying the count is optional and will default to 1.
    ///
    /// You can specify multiple behaviours by using the flag multiple times.
    ///
    /// The total assigned must be less than or equal to the number of virtual users. Remaining
    /// users run the default behaviour.
    #[clap(long, short, value_parser = parse_agent_behaviour)]
    pub behaviour: Vec<(String, usize)>,

    /// The number of seconds to run the scenario for
    #[clap(long)]
    pub duration: Option<u64>,

    /// Run as a soak test, ignoring any configured duration and continuing until stopped
    #[clap(long, default_value = "false")]
    pub soak: bool,

    /// Do not show a progress bar on the CLI.
    ///
    /// Recommended for CI where nobody is watching the progress bar.
    #[clap(long, default_value = "false")]
    pub no_progress: bool,

    /// The reporter to use.
    #[arg(long, value_enum, default_value_t = ReporterOpt::InMemory)]
    pub reporter: ReporterOpt,

    /// Directory for report files written by `--reporter=jsonl-file`.
    #[arg(long, default_value = "reports")]
    pub reports_dir: PathBuf,

    /// Set the ID of this run
    ///
    /// If not set, a random ID is used.
    #[arg(long, short)]
    pub run_id: Option<String>,

    /// Append a JSON summary of the run to this file once the run finishes.
    #[arg(long)]
    pub run_summary_path: Option<PathBuf>,
}

pub fn parse_agent_behaviour(s: &str) -> anyhow::Result<(String, usize)> {
    let mut parts = s.split(':');
    let name = parts
        .next()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .ok_or(anyhow::anyhow!("No name specified for behaviour"))?;

    let count = match parts.next() {
        Some(count) => count
            .parse::<usize>()
            .map_err(|e| anyhow::anyhow!("Invalid count for behaviour [{name}]: {e}"))?,
        None => 1,
    };

    Ok((name, count))
}
