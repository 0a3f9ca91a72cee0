//! Test plan model
//!
//! A plan is a line-oriented table of filter test cases. Each case is a
//! block of `key:value` lines; blocks are separated by blank lines:
//!
//! ```text
//! # optional header
//!
//! id:3
//! description:tcp
//! filter:tcp
//! pcap_file:ws/v4.pcap
//! expected_result:41
//! enabled:true
//! ```

mod parser;

pub use parser::parse;

/// One plan entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// Positive id, unique within the plan
    pub id: u32,
    /// Free-text label
    pub description: String,
    /// Filter expression; empty matches every packet
    pub filter: String,
    /// Capture path, relative to the capture root
    pub pcap_path: String,
    /// Number of packets the filter must match
    pub expected_count: u64,
    /// Disabled cases are parsed but never executed
    pub enabled: bool,
    /// 1-based line where the case block starts
    pub line: usize,
}

/// Ordered sequence of cases, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestPlan {
    /// `#` lines preceding the first case, without the leading `#`
    pub header: Vec<String>,
    pub cases: Vec<TestCase>,
}

impl TestPlan {
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TestCase> {
        self.cases.iter()
    }

    /// Look up a case by id
    pub fn get(&self, id: u32) -> Option<&TestCase> {
        self.cases.iter().find(|c| c.id == id)
    }

    /// Number of cases with `enabled:true`
    pub fn enabled_count(&self) -> usize {
        self.cases.iter().filter(|c| c.enabled).count()
    }
}

impl<'a> IntoIterator for &'a TestPlan {
    type Item = &'a TestCase;
    type IntoIter = std::slice::Iter<'a, TestCase>;

    fn into_iter(self) -> Self::IntoIter {
        self.cases.iter()
    }
}
