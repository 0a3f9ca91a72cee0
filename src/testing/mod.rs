//! Plan execution
//!
//! Runs the cases of a parsed plan against a filter compiler and a capture
//! reader, and classifies each result as PASS, FAIL or SKIP. Only a
//! malformed plan aborts a run; every other failure stays local to its
//! case.

mod executor;
pub mod report;
mod runner;
mod verdict;

#[cfg(test)]
pub(crate) mod fakes;

pub use executor::{count_matches, execute};
pub use runner::{run, RunOptions, RunSummary, Runner};
pub use verdict::{compare, Execution, Outcome, Verdict};
