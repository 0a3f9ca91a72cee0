//! filtertest - regression-test harness for packet filter engines
//!
//! A plan declares filter test cases (filter expression, capture file,
//! expected match count). The harness compiles each filter, replays the
//! capture through it, and compares the number of matches with the
//! expectation.

pub mod cli;
pub mod commands;
pub mod common;
pub mod engine;
pub mod plan;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use plan::{TestCase, TestPlan};
pub use testing::{Outcome, RunSummary, Verdict};
