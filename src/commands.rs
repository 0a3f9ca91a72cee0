//! CLI command definitions
//!
//! Defines the clap commands for the filtertest CLI.

use clap::Subcommand;
use std::path::PathBuf;

use crate::common::config::{ColorMode, ReportFormat};

#[derive(Subcommand)]
pub enum Commands {
    /// Run every case of a test plan and report PASS/FAIL/SKIP per case
    Run {
        /// Path to the test plan
        plan: PathBuf,

        /// Directory that capture paths in the plan are relative to
        /// (default: run.capture_root from the config file)
        capture_root: Option<PathBuf>,

        /// Number of cases executed concurrently
        #[arg(long, short)]
        jobs: Option<usize>,

        /// Per-case timeout in seconds, 0 disables it
        #[arg(long)]
        timeout: Option<u64>,

        /// Report format
        #[arg(long, value_enum)]
        format: Option<ReportFormat>,

        /// When to colorize the text report
        #[arg(long, value_enum)]
        color: Option<ColorMode>,

        /// Only execute this case id; other cases are skipped.
        /// Can be specified multiple times: --only 3 --only 7
        #[arg(long = "only", value_name = "ID")]
        only: Vec<u32>,
    },

    /// Validate a test plan without running it
    Check {
        /// Path to the test plan
        plan: PathBuf,
    },

    /// List the cases of a test plan, tab separated
    List {
        /// Path to the test plan
        plan: PathBuf,
    },

    /// Count the packets of one capture matched by one filter
    Count {
        /// Filter expression; quote it as a single argument
        filter: String,

        /// Path to the capture file
        capture: PathBuf,
    },
}
