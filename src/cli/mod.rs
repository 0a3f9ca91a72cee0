//! CLI command handling
//!
//! Dispatches CLI commands and formats their output. Verdicts and command
//! results go to stdout; diagnostics go through tracing to stderr.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::commands::Commands;
use crate::common::config::{ColorMode, Config, ReportFormat};
use crate::common::{Error, Result};
use crate::engine::{CaptureReader, FilterCompiler, NativeCompiler, PcapFileReader};
use crate::plan::{self, TestPlan};
use crate::testing::{count_matches, report, RunOptions, RunSummary, Runner};

/// Dispatch a CLI command
///
/// Returns `Ok(false)` when the command completed but the run had failing
/// cases, so the caller can exit non-zero without printing an error.
pub async fn dispatch(command: Commands, config: &Config) -> Result<bool> {
    match command {
        Commands::Run {
            plan,
            capture_root,
            jobs,
            timeout,
            format,
            color,
            only,
        } => {
            let capture_root = capture_root
                .or_else(|| config.run.capture_root.clone())
                .ok_or_else(|| {
                    Error::Config(
                        "no capture root given and run.capture_root is not configured".to_string(),
                    )
                })?;

            let jobs = jobs.unwrap_or(config.run.jobs);
            if jobs == 0 {
                return Err(Error::Config("--jobs must be at least 1".to_string()));
            }
            let timeout_secs = timeout.unwrap_or(config.run.case_timeout_secs);

            apply_color(color.unwrap_or(config.output.color));

            let test_plan = load_plan(&plan)?;
            for id in &only {
                if test_plan.get(*id).is_none() {
                    tracing::warn!(case_id = id, "--only names a case that is not in the plan");
                }
            }

            let options = RunOptions {
                jobs,
                case_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
                only,
            };
            let runner = Runner::new(
                Arc::new(NativeCompiler::new()),
                Arc::new(PcapFileReader::new()),
                options,
            );

            let summary = run_and_report(
                &runner,
                &test_plan,
                &capture_root,
                format.unwrap_or(config.output.format),
            )
            .await?;
            Ok(summary.success())
        }

        Commands::Check { plan } => {
            let test_plan = load_plan(&plan)?;
            println!(
                "{} cases ({} enabled)",
                test_plan.len(),
                test_plan.enabled_count()
            );
            Ok(true)
        }

        Commands::List { plan } => {
            let test_plan = load_plan(&plan)?;
            for case in &test_plan {
                println!(
                    "{}\t{}\t{}\t{}",
                    case.id, case.enabled, case.filter, case.pcap_path
                );
            }
            Ok(true)
        }

        Commands::Count { filter, capture } => {
            let matcher = NativeCompiler::new().compile(&filter)?;
            let packets = PcapFileReader::new().read(&capture)?;
            println!("{}", count_matches(matcher.as_ref(), &packets));
            Ok(true)
        }
    }
}

async fn run_and_report(
    runner: &Runner,
    plan: &TestPlan,
    capture_root: &Path,
    format: ReportFormat,
) -> Result<RunSummary> {
    match format {
        ReportFormat::Text => {
            let summary = runner
                .run_plan(plan, capture_root, |verdict| {
                    println!("{}", report::colored_verdict_line(verdict));
                })
                .await;
            println!("{}", report::summary_line(&summary));
            Ok(summary)
        }
        ReportFormat::Json => {
            let summary = runner.run_plan(plan, capture_root, |_| {}).await;
            println!("{}", report::render_json(&summary)?);
            Ok(summary)
        }
    }
}

fn load_plan(path: &Path) -> Result<TestPlan> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;
    let plan = plan::parse(&text)?;
    tracing::debug!(
        path = %path.display(),
        cases = plan.len(),
        "plan loaded"
    );
    Ok(plan)
}

fn apply_color(mode: ColorMode) {
    match mode {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        // colored checks the terminal and NO_COLOR itself
        ColorMode::Auto => {}
    }
}
