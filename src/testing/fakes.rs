//! In-memory collaborators for runner and executor tests

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::common::{Error, Result};
use crate::engine::{Capture, CaptureReader, FilterCompiler, Frame, LinkType, Matcher, Packet};
use crate::plan::TestCase;

pub fn case(id: u32, filter: &str, pcap: &str, expected: u64) -> TestCase {
    TestCase {
        id,
        description: format!("case {}", id),
        filter: filter.to_string(),
        pcap_path: pcap.to_string(),
        expected_count: expected,
        enabled: true,
        line: 1,
    }
}

/// Understands three filters: `""` (everything), `"odd"` (first byte odd)
/// and `"bad"` (compile error).
#[derive(Default)]
pub struct FakeCompiler {
    calls: AtomicUsize,
}

impl FakeCompiler {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

struct All;
struct Odd;

impl Matcher for All {
    fn matches(&self, _frame: &Frame<'_>) -> bool {
        true
    }
}

impl Matcher for Odd {
    fn matches(&self, frame: &Frame<'_>) -> bool {
        frame.data.first().is_some_and(|b| b % 2 == 1)
    }
}

impl FilterCompiler for FakeCompiler {
    fn compile(&self, expression: &str) -> Result<Box<dyn Matcher>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match expression {
            "" => Ok(Box::new(All)),
            "odd" => Ok(Box::new(Odd)),
            other => Err(Error::Compile(format!("unknown filter '{}'", other))),
        }
    }
}

/// Captures keyed by file name; each packet is a single byte.
#[derive(Default)]
pub struct FakeReader {
    captures: HashMap<String, Vec<u8>>,
    delays: HashMap<String, Duration>,
    paths: Mutex<Vec<String>>,
}

impl FakeReader {
    pub fn with(mut self, name: &str, packets: &[u8]) -> Self {
        self.captures.insert(name.to_string(), packets.to_vec());
        self
    }

    /// Block for `delay` before returning this capture.
    pub fn slow(mut self, name: &str, packets: &[u8], delay: Duration) -> Self {
        self.delays.insert(name.to_string(), delay);
        self.with(name, packets)
    }

    pub fn calls(&self) -> usize {
        self.paths().len()
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl CaptureReader for FakeReader {
    fn read(&self, path: &Path) -> Result<Capture> {
        if let Ok(mut paths) = self.paths.lock() {
            paths.push(path.display().to_string());
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if let Some(delay) = self.delays.get(&name) {
            std::thread::sleep(*delay);
        }
        let packets = self
            .captures
            .get(&name)
            .ok_or_else(|| Error::capture_read(path, "No such file or directory"))?;
        let mut capture = Capture::new(LinkType::Raw);
        capture.packets = packets.iter().map(|b| Packet::new(vec![*b])).collect();
        Ok(capture)
    }
}
