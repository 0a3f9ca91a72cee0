//! Filter engine collaborators
//!
//! The harness talks to a filter engine through two capabilities:
//! a [`FilterCompiler`] that turns an expression into a [`Matcher`], and a
//! [`CaptureReader`] that loads the packets of a capture file. Any
//! implementation satisfying these traits can be plugged into the runner.
//!
//! The crate ships [`NativeCompiler`] (a pcap-filter subset) and
//! [`PcapFileReader`] (classic libpcap files).

pub mod capture;
pub mod filter;
pub mod frame;

use std::path::Path;

use crate::common::Result;

pub use capture::PcapFileReader;
pub use filter::NativeCompiler;
pub use frame::{Frame, LinkType};

/// A compiled packet predicate
///
/// Must be pure: the result depends only on the frame.
pub trait Matcher: Send + Sync {
    fn matches(&self, frame: &Frame<'_>) -> bool;
}

/// Compiles filter expressions into matchers
pub trait FilterCompiler: Send + Sync {
    /// Compile `expression`; an empty expression matches every packet.
    ///
    /// Fails with [`crate::Error::Compile`] on invalid syntax or semantics.
    fn compile(&self, expression: &str) -> Result<Box<dyn Matcher>>;
}

/// Loads captures from disk
pub trait CaptureReader: Send + Sync {
    /// Read every packet of the capture at `path`, in capture order.
    ///
    /// Fails with [`crate::Error::CaptureRead`] if the file is unreadable or
    /// its container format is invalid.
    fn read(&self, path: &Path) -> Result<Capture>;
}

/// One captured packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub data: Vec<u8>,
    /// Original length on the wire; at least `data.len()` for sane captures
    pub wire_len: u32,
}

impl Packet {
    /// A packet captured in full
    pub fn new(data: Vec<u8>) -> Self {
        let wire_len = u32::try_from(data.len()).unwrap_or(u32::MAX);
        Self { data, wire_len }
    }
}

/// The packets of a capture file, sharing one link type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub link_type: LinkType,
    pub packets: Vec<Packet>,
}

impl Capture {
    pub fn new(link_type: LinkType) -> Self {
        Self {
            link_type,
            packets: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Frames in capture order
    pub fn frames(&self) -> impl Iterator<Item = Frame<'_>> + '_ {
        self.packets
            .iter()
            .map(move |p| Frame::new(self.link_type, &p.data, p.wire_len))
    }
}
