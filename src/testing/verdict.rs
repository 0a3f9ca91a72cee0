//! Verdict classification

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::common::Error;
use crate::plan::TestCase;

/// What happened when a case was (or was not) executed
#[derive(Debug)]
pub enum Execution {
    /// `enabled:false` in the plan
    Disabled,
    /// Excluded by a `--only` selection
    FilteredOut,
    Counted(u64),
    Failed(Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Pass,
    Fail,
    Skip,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Outcome::Pass => "PASS",
            Outcome::Fail => "FAIL",
            Outcome::Skip => "SKIP",
        })
    }
}

/// Result of one case
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub case_id: u32,
    pub description: String,
    pub outcome: Outcome,
    /// Present only when the packets were counted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_count: Option<u64>,
    pub expected_count: u64,
    /// Mismatch, error or skip reason; absent on PASS
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Error kind for failures caused by an error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

impl Verdict {
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn is_fail(&self) -> bool {
        self.outcome == Outcome::Fail
    }
}

/// Classify an execution against the case's expectation.
pub fn compare(case: &TestCase, execution: Execution) -> Verdict {
    let (outcome, actual_count, message, error_kind) = match execution {
        Execution::Disabled => (Outcome::Skip, None, Some("disabled".to_string()), None),
        Execution::FilteredOut => (Outcome::Skip, None, Some("filtered out".to_string()), None),
        Execution::Failed(err) => (Outcome::Fail, None, Some(err.to_string()), Some(err.kind())),
        Execution::Counted(actual) if actual == case.expected_count => {
            (Outcome::Pass, Some(actual), None, None)
        }
        Execution::Counted(actual) => (
            Outcome::Fail,
            Some(actual),
            Some(format!("{} != {}", actual, case.expected_count)),
            None,
        ),
    };

    Verdict {
        case_id: case.id,
        description: case.description.clone(),
        outcome,
        actual_count,
        expected_count: case.expected_count,
        message,
        error_kind,
        elapsed: Duration::ZERO,
    }
}
