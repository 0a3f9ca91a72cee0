//! Plan runner
//!
//! Executes every case of a plan and classifies the results. Each enabled
//! case runs on the blocking pool; up to `jobs` cases are in flight at once
//! but verdicts are always delivered in plan order.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::stream::{self, StreamExt};
use serde::Serialize;

use super::executor::execute;
use super::verdict::{compare, Execution, Outcome, Verdict};
use crate::common::{Error, Result};
use crate::engine::{CaptureReader, FilterCompiler};
use crate::plan::{self, TestCase, TestPlan};

/// Execution options for a run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Cases executed concurrently; 1 runs the plan sequentially
    pub jobs: usize,
    /// Per-case limit; `None` waits forever
    pub case_timeout: Option<Duration>,
    /// When non-empty, only these case ids are executed
    pub only: Vec<u32>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            jobs: 1,
            case_timeout: None,
            only: Vec::new(),
        }
    }
}

/// Verdicts of a run plus tallies
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub verdicts: Vec<Verdict>,
    pub pass: usize,
    pub fail: usize,
    pub skip: usize,
    pub total: usize,
}

impl RunSummary {
    fn push(&mut self, verdict: Verdict) {
        match verdict.outcome {
            Outcome::Pass => self.pass += 1,
            Outcome::Fail => self.fail += 1,
            Outcome::Skip => self.skip += 1,
        }
        self.total += 1;
        self.verdicts.push(verdict);
    }

    /// True when no case failed
    pub fn success(&self) -> bool {
        self.fail == 0
    }
}

/// Runs plans against a pair of collaborators
pub struct Runner {
    compiler: Arc<dyn FilterCompiler>,
    reader: Arc<dyn CaptureReader>,
    options: RunOptions,
}

impl Runner {
    pub fn new(
        compiler: Arc<dyn FilterCompiler>,
        reader: Arc<dyn CaptureReader>,
        options: RunOptions,
    ) -> Self {
        Self {
            compiler,
            reader,
            options,
        }
    }

    /// Parse `plan_text` and run it.
    ///
    /// A malformed plan fails before any case runs. `on_verdict` is called
    /// once per case, in plan order, as soon as that case is classified.
    pub async fn run<F>(&self, plan_text: &str, capture_root: &Path, on_verdict: F) -> Result<RunSummary>
    where
        F: FnMut(&Verdict),
    {
        let plan = plan::parse(plan_text)?;
        Ok(self.run_plan(&plan, capture_root, on_verdict).await)
    }

    /// Run an already parsed plan.
    pub async fn run_plan<F>(&self, plan: &TestPlan, capture_root: &Path, mut on_verdict: F) -> RunSummary
    where
        F: FnMut(&Verdict),
    {
        let jobs = self.options.jobs.max(1);
        tracing::info!(
            cases = plan.len(),
            enabled = plan.enabled_count(),
            jobs,
            root = %capture_root.display(),
            "starting run"
        );

        let mut verdicts = stream::iter(plan.iter().cloned())
            .map(|case| self.run_case(case, capture_root.to_path_buf()))
            .buffered(jobs);

        let mut summary = RunSummary::default();
        while let Some(verdict) = verdicts.next().await {
            on_verdict(&verdict);
            summary.push(verdict);
        }

        tracing::info!(
            total = summary.total,
            pass = summary.pass,
            fail = summary.fail,
            skip = summary.skip,
            "run finished"
        );
        summary
    }

    async fn run_case(&self, case: TestCase, capture_root: PathBuf) -> Verdict {
        if !case.enabled {
            tracing::debug!(case_id = case.id, "case disabled");
            return compare(&case, Execution::Disabled);
        }
        if !self.options.only.is_empty() && !self.options.only.contains(&case.id) {
            tracing::debug!(case_id = case.id, "case not selected");
            return compare(&case, Execution::FilteredOut);
        }

        tracing::debug!(case_id = case.id, filter = %case.filter, pcap = %case.pcap_path, "case started");
        let started = Instant::now();
        let execution = self.execute_blocking(&case, capture_root).await;
        let verdict = compare(&case, execution).with_elapsed(started.elapsed());

        if verdict.is_fail() {
            tracing::warn!(
                case_id = case.id,
                reason = verdict.message.as_deref().unwrap_or_default(),
                "case failed"
            );
        } else {
            tracing::debug!(case_id = case.id, elapsed = ?verdict.elapsed, "case passed");
        }
        verdict
    }

    async fn execute_blocking(&self, case: &TestCase, capture_root: PathBuf) -> Execution {
        let compiler = Arc::clone(&self.compiler);
        let reader = Arc::clone(&self.reader);
        let task_case = case.clone();
        let handle = tokio::task::spawn_blocking(move || {
            execute(&task_case, &capture_root, compiler.as_ref(), reader.as_ref())
        });

        let joined = match self.options.case_timeout {
            Some(limit) => match tokio::time::timeout(limit, handle).await {
                Ok(joined) => joined,
                // The blocking task cannot be cancelled; it finishes in the
                // background and its result is dropped.
                Err(_) => return Execution::Failed(Error::Timeout(limit.as_secs())),
            },
            None => handle.await,
        };

        match joined {
            Ok(Ok(count)) => Execution::Counted(count),
            Ok(Err(e)) => {
                if !e.is_per_case() {
                    tracing::error!(case_id = case.id, error = %e, "unexpected error while executing case");
                }
                Execution::Failed(e)
            }
            Err(e) => Execution::Failed(Error::Internal(format!("case {} aborted: {}", case.id, e))),
        }
    }
}

/// Run `plan_text` with default wiring of the given collaborators.
pub async fn run<F>(
    plan_text: &str,
    capture_root: &Path,
    compiler: Arc<dyn FilterCompiler>,
    reader: Arc<dyn CaptureReader>,
    options: RunOptions,
    on_verdict: F,
) -> Result<RunSummary>
where
    F: FnMut(&Verdict),
{
    Runner::new(compiler, reader, options)
        .run(plan_text, capture_root, on_verdict)
        .await
}
