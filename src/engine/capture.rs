//! Capture file reader
//!
//! Reads classic libpcap files (either byte order, micro- or nanosecond
//! timestamps) through `pcap-parser`. Gzip-compressed captures are detected
//! by their magic bytes and decompressed on the fly.

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use pcap_parser::traits::PcapReaderIterator;
use pcap_parser::{LegacyPcapReader, PcapBlockOwned, PcapError};

use super::{Capture, CaptureReader, LinkType, Packet};
use crate::common::{Error, Result};

/// Read buffer size; records larger than this cannot be parsed
const READER_CAPACITY: usize = 1 << 20;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// [`CaptureReader`] for libpcap files on the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct PcapFileReader;

impl PcapFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl CaptureReader for PcapFileReader {
    fn read(&self, path: &Path) -> Result<Capture> {
        let file = File::open(path).map_err(|e| Error::capture_read(path, e))?;
        let mut buffered = BufReader::new(file);

        let head = buffered.fill_buf().map_err(|e| Error::capture_read(path, e))?;
        if head.is_empty() {
            return Err(Error::capture_read(path, "file is empty"));
        }

        let capture = if head.starts_with(&GZIP_MAGIC) {
            let mut bytes = Vec::new();
            GzDecoder::new(buffered)
                .read_to_end(&mut bytes)
                .map_err(|e| Error::capture_read(path, format!("gzip: {}", e)))?;
            read_legacy(Cursor::new(bytes))
        } else {
            read_legacy(buffered)
        };

        let capture = capture.map_err(|reason| Error::capture_read(path, reason))?;
        tracing::debug!(
            path = %path.display(),
            link_type = ?capture.link_type,
            packets = capture.len(),
            "capture loaded"
        );
        Ok(capture)
    }
}

fn read_legacy<R: Read>(input: R) -> std::result::Result<Capture, String> {
    let mut reader = LegacyPcapReader::new(READER_CAPACITY, input).map_err(|e| describe(&e))?;
    let mut capture: Option<Capture> = None;

    loop {
        match reader.next() {
            Ok((offset, block)) => {
                match block {
                    PcapBlockOwned::LegacyHeader(header) => {
                        capture = Some(Capture::new(LinkType::from_dlt(header.network.0)));
                    }
                    PcapBlockOwned::Legacy(record) => {
                        let capture = capture
                            .as_mut()
                            .ok_or_else(|| "packet record before file header".to_string())?;
                        capture.packets.push(Packet {
                            data: record.data.to_vec(),
                            wire_len: record.origlen,
                        });
                    }
                    PcapBlockOwned::NG(_) => {
                        return Err("pcapng blocks are not supported".to_string());
                    }
                }
                reader.consume(offset);
            }
            Err(PcapError::Eof) => break,
            Err(PcapError::Incomplete(_)) => {
                reader.refill().map_err(|e| describe(&e))?;
            }
            Err(e) => return Err(describe(&e)),
        }
    }

    capture.ok_or_else(|| "missing pcap file header".to_string())
}

fn describe<I: std::fmt::Debug>(e: &PcapError<I>) -> String {
    match e {
        PcapError::HeaderNotRecognized => "not a pcap file (unrecognized header)".to_string(),
        other => format!("invalid pcap data: {:?}", other),
    }
}
