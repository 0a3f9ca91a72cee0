//! Single-case execution

use std::path::Path;

use crate::common::paths::resolve_capture;
use crate::common::Result;
use crate::engine::{Capture, CaptureReader, FilterCompiler, Matcher};
use crate::plan::TestCase;

/// Count the packets of the case's capture accepted by its filter.
///
/// The filter is compiled before the capture is read, so an invalid
/// filter is reported even when the capture is also missing. Every packet
/// is evaluated; there is no early exit.
pub fn execute(
    case: &TestCase,
    capture_root: &Path,
    compiler: &dyn FilterCompiler,
    reader: &dyn CaptureReader,
) -> Result<u64> {
    let matcher = compiler.compile(&case.filter)?;

    let path = resolve_capture(capture_root, &case.pcap_path);
    let capture = reader.read(&path)?;

    let count = count_matches(matcher.as_ref(), &capture);

    tracing::debug!(
        case_id = case.id,
        packets = capture.len(),
        matched = count,
        "case executed"
    );
    Ok(count)
}

/// Number of frames in `capture` accepted by `matcher`
pub fn count_matches(matcher: &dyn Matcher, capture: &Capture) -> u64 {
    capture
        .frames()
        .fold(0u64, |n, frame| n + u64::from(matcher.matches(&frame)))
}
