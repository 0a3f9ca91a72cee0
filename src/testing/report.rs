//! Report rendering
//!
//! Text output is one `tc id` line per case followed by an aggregate line,
//! so a run can be grepped and diffed:
//!
//! ```text
//! tc id 1 FAIL (48 != 47)
//! tc id 2 PASS
//! tc id 3 SKIP
//! 3 cases: 1 passed, 1 failed, 1 skipped
//! ```

use colored::Colorize;

use super::runner::RunSummary;
use super::verdict::{Outcome, Verdict};
use crate::common::Result;

/// Plain verdict line
pub fn verdict_line(verdict: &Verdict) -> String {
    format_line(verdict, &verdict.outcome.to_string())
}

/// Verdict line with the outcome highlighted
pub fn colored_verdict_line(verdict: &Verdict) -> String {
    let label = match verdict.outcome {
        Outcome::Pass => "PASS".green().bold(),
        Outcome::Fail => "FAIL".red().bold(),
        Outcome::Skip => "SKIP".yellow(),
    };
    format_line(verdict, &label.to_string())
}

fn format_line(verdict: &Verdict, label: &str) -> String {
    match (&verdict.outcome, &verdict.message) {
        (Outcome::Fail, Some(message)) => {
            format!("tc id {} {} ({})", verdict.case_id, label, message)
        }
        _ => format!("tc id {} {}", verdict.case_id, label),
    }
}

/// Aggregate line
pub fn summary_line(summary: &RunSummary) -> String {
    format!(
        "{} cases: {} passed, {} failed, {} skipped",
        summary.total, summary.pass, summary.fail, summary.skip
    )
}

/// Whole run as a JSON document
pub fn render_json(summary: &RunSummary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}
