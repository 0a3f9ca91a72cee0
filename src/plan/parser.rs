//! Plan text parser

use std::collections::HashMap;

use super::{TestCase, TestPlan};
use crate::common::{Error, Result};

const KEY_ID: &str = "id";
const KEY_DESCRIPTION: &str = "description";
const KEY_FILTER: &str = "filter";
const KEY_PCAP_FILE: &str = "pcap_file";
const KEY_EXPECTED: &str = "expected_result";
const KEY_ENABLED: &str = "enabled";

const KNOWN_KEYS: [&str; 6] = [
    KEY_ID,
    KEY_DESCRIPTION,
    KEY_FILTER,
    KEY_PCAP_FILE,
    KEY_EXPECTED,
    KEY_ENABLED,
];

/// One `key:value` line of a block
struct Field<'a> {
    line: usize,
    value: &'a str,
}

/// Lines of a single case block, keyed by field name
struct Block<'a> {
    start: usize,
    fields: HashMap<&'static str, Field<'a>>,
}

impl<'a> Block<'a> {
    fn new(start: usize) -> Self {
        Self {
            start,
            fields: HashMap::new(),
        }
    }

    fn insert(&mut self, line: usize, key: &str, value: &'a str) -> Result<()> {
        let key = KNOWN_KEYS
            .iter()
            .copied()
            .find(|k| *k == key)
            .ok_or_else(|| Error::malformed(line, format!("unknown key '{}'", key)))?;

        if let Some(previous) = self.fields.get(key) {
            return Err(Error::malformed(
                line,
                format!("key '{}' already set on line {}", key, previous.line),
            ));
        }
        self.fields.insert(key, Field { line, value });
        Ok(())
    }

    fn require(&self, key: &'static str) -> Result<&Field<'a>> {
        self.fields.get(key).ok_or_else(|| {
            Error::malformed(self.start, format!("case is missing required key '{}'", key))
        })
    }

    fn into_case(self) -> Result<TestCase> {
        let id = self.require(KEY_ID)?;
        let id_value = parse_unsigned(id.value)
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
            .ok_or_else(|| {
                Error::malformed(id.line, format!("id must be a positive integer, got '{}'", id.value))
            })?;

        let description = self.require(KEY_DESCRIPTION)?;
        if description.value.is_empty() {
            return Err(Error::malformed(description.line, "description must not be empty"));
        }

        let filter = self.require(KEY_FILTER)?;

        let pcap = self.require(KEY_PCAP_FILE)?;
        if pcap.value.is_empty() {
            return Err(Error::malformed(pcap.line, "pcap_file must not be empty"));
        }

        let expected = self.require(KEY_EXPECTED)?;
        let expected_count = parse_unsigned(expected.value).ok_or_else(|| {
            Error::malformed(
                expected.line,
                format!(
                    "expected_result must be a non-negative integer, got '{}'",
                    expected.value
                ),
            )
        })?;

        let enabled = self.require(KEY_ENABLED)?;
        let enabled_value = match enabled.value {
            "true" => true,
            "false" => false,
            other => {
                return Err(Error::malformed(
                    enabled.line,
                    format!("enabled must be 'true' or 'false', got '{}'", other),
                ))
            }
        };

        Ok(TestCase {
            id: id_value,
            description: description.value.to_string(),
            filter: filter.value.to_string(),
            pcap_path: pcap.value.to_string(),
            expected_count,
            enabled: enabled_value,
            line: self.start,
        })
    }
}

/// Digits only; rejects signs, which `str::parse` would accept.
fn parse_unsigned(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn push_case(block: Block<'_>, plan: &mut TestPlan, seen_ids: &mut HashMap<u32, usize>) -> Result<()> {
    let case = block.into_case()?;
    if let Some(first) = seen_ids.insert(case.id, case.line) {
        return Err(Error::malformed(
            case.line,
            format!("duplicate id {} (first declared on line {})", case.id, first),
        ));
    }
    plan.cases.push(case);
    Ok(())
}

/// Parse plan text into an ordered [`TestPlan`].
///
/// Fails with [`Error::MalformedPlan`] on the first structural problem:
/// unknown or repeated keys, missing fields, bad values or a repeated id.
pub fn parse(text: &str) -> Result<TestPlan> {
    let mut plan = TestPlan::default();
    let mut seen_ids: HashMap<u32, usize> = HashMap::new();
    let mut block: Option<Block<'_>> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();

        if line.is_empty() {
            if let Some(done) = block.take() {
                push_case(done, &mut plan, &mut seen_ids)?;
            }
            continue;
        }

        if let Some(comment) = line.strip_prefix('#') {
            if block.is_none() && plan.cases.is_empty() {
                plan.header.push(comment.trim().to_string());
            }
            continue;
        }

        let (key, value) = line.split_once(':').ok_or_else(|| {
            Error::malformed(line_no, format!("expected 'key:value', got '{}'", line))
        })?;

        block
            .get_or_insert_with(|| Block::new(line_no))
            .insert(line_no, key.trim(), value.trim())?;
    }

    if let Some(done) = block.take() {
        push_case(done, &mut plan, &mut seen_ids)?;
    }

    Ok(plan)
}
