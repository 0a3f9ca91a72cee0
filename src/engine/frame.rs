//! Link-layer framing for captured packets
//!
//! Resolves where the network header starts and which network protocol it
//! carries, for every link type a capture file may declare.

/// Data link type declared by a capture file header.
///
/// Determines the link-layer framing, and therefore where the network
/// header starts inside each packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    /// BSD loopback (DLT_NULL = 0): 4-byte AF header in the writer's byte order.
    Null,
    /// Ethernet (DLT_EN10MB = 1): 14-byte header, EtherType at offset 12.
    Ethernet,
    /// Raw IP (DLT_RAW = 12/14, LINKTYPE_RAW = 101): IP starts at offset 0.
    Raw,
    /// OpenBSD loopback (DLT_LOOP = 108): 4-byte AF header in network order.
    Loop,
    /// Linux cooked capture (DLT_LINUX_SLL = 113): 16-byte header,
    /// protocol at offset 14.
    LinuxSll,
    /// Any other link type; only `link[...]` accesses work on it.
    Other(i32),
}

impl LinkType {
    /// Map a pcap header `network` value to a link type.
    pub fn from_dlt(dlt: i32) -> Self {
        match dlt {
            0 => LinkType::Null,
            1 => LinkType::Ethernet,
            12 | 14 | 101 => LinkType::Raw,
            108 => LinkType::Loop,
            113 => LinkType::LinuxSll,
            other => LinkType::Other(other),
        }
    }
}

pub const ETHERTYPE_IPV4: u16 = 0x0800;
pub const ETHERTYPE_ARP: u16 = 0x0806;
pub const ETHERTYPE_RARP: u16 = 0x8035;
pub const ETHERTYPE_IPV6: u16 = 0x86DD;

const ETH_HLEN: usize = 14;
const SLL_HLEN: usize = 16;
const AF_HLEN: usize = 4;

// Address family values used by the loopback encapsulations.
const AF_INET: u32 = 2;
const AF_INET6_BSD: u32 = 24;
const AF_INET6_FREEBSD: u32 = 28;
const AF_INET6_DARWIN: u32 = 30;

// Largest value that is an 802.3 length field rather than an EtherType.
const ETHER_MAX_LEN_FIELD: u16 = 1500;

/// A single captured packet as seen by a matcher.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub link_type: LinkType,
    /// Captured bytes (possibly truncated by the snap length)
    pub data: &'a [u8],
    /// Length of the packet on the wire
    pub wire_len: u32,
}

/// Network layer location within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkLayer {
    /// EtherType-style protocol identifier
    pub proto: u16,
    /// Offset of the network header from the start of the frame
    pub offset: usize,
}

impl<'a> Frame<'a> {
    pub fn new(link_type: LinkType, data: &'a [u8], wire_len: u32) -> Self {
        Self {
            link_type,
            data,
            wire_len,
        }
    }

    /// Locate the network header.
    ///
    /// Returns `None` for truncated frames, 802.3 length-field frames and
    /// link types without a known network layer.
    pub fn network(&self) -> Option<NetworkLayer> {
        let data = self.data;
        match self.link_type {
            LinkType::Ethernet => {
                if data.len() < ETH_HLEN {
                    return None;
                }
                let proto = u16::from_be_bytes([data[12], data[13]]);
                if proto <= ETHER_MAX_LEN_FIELD {
                    return None;
                }
                Some(NetworkLayer {
                    proto,
                    offset: ETH_HLEN,
                })
            }
            LinkType::LinuxSll => {
                if data.len() < SLL_HLEN {
                    return None;
                }
                Some(NetworkLayer {
                    proto: u16::from_be_bytes([data[14], data[15]]),
                    offset: SLL_HLEN,
                })
            }
            LinkType::Raw => {
                let proto = match data.first()? >> 4 {
                    4 => ETHERTYPE_IPV4,
                    6 => ETHERTYPE_IPV6,
                    _ => return None,
                };
                Some(NetworkLayer { proto, offset: 0 })
            }
            LinkType::Null => {
                let header: [u8; 4] = data.get(..AF_HLEN)?.try_into().ok()?;
                // Written in the capturing host's byte order, which may
                // differ from ours.
                let family = af_to_ethertype(u32::from_le_bytes(header))
                    .or_else(|| af_to_ethertype(u32::from_be_bytes(header)))?;
                Some(NetworkLayer {
                    proto: family,
                    offset: AF_HLEN,
                })
            }
            LinkType::Loop => {
                let header: [u8; 4] = data.get(..AF_HLEN)?.try_into().ok()?;
                Some(NetworkLayer {
                    proto: af_to_ethertype(u32::from_be_bytes(header))?,
                    offset: AF_HLEN,
                })
            }
            LinkType::Other(_) => None,
        }
    }

    /// Read a big-endian value of 1, 2 or 4 bytes at `offset`.
    pub fn load(&self, offset: usize, size: usize) -> Option<u32> {
        let end = offset.checked_add(size)?;
        let bytes = self.data.get(offset..end)?;
        match size {
            1 => Some(u32::from(bytes[0])),
            2 => Some(u32::from(u16::from_be_bytes([bytes[0], bytes[1]]))),
            4 => Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
            _ => None,
        }
    }

    /// Borrow `len` bytes at `offset`, if captured.
    pub fn bytes(&self, offset: usize, len: usize) -> Option<&'a [u8]> {
        self.data.get(offset..offset.checked_add(len)?)
    }
}

fn af_to_ethertype(family: u32) -> Option<u16> {
    match family {
        AF_INET => Some(ETHERTYPE_IPV4),
        AF_INET6_BSD | AF_INET6_FREEBSD | AF_INET6_DARWIN => Some(ETHERTYPE_IPV6),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ethernet_network_layer() {
        let mut pkt = vec![0u8; 34];
        pkt[12] = 0x08;
        pkt[13] = 0x00;
        let frame = Frame::new(LinkType::Ethernet, &pkt, 34);
        assert_eq!(
            frame.network(),
            Some(NetworkLayer {
                proto: ETHERTYPE_IPV4,
                offset: 14
            })
        );
    }

    #[test]
    fn ethernet_length_field_has_no_network_layer() {
        let mut pkt = vec![0u8; 60];
        pkt[12] = 0x00;
        pkt[13] = 0x2e;
        let frame = Frame::new(LinkType::Ethernet, &pkt, 60);
        assert_eq!(frame.network(), None);
    }

    #[test]
    fn truncated_ethernet() {
        let pkt = [0u8; 10];
        assert_eq!(Frame::new(LinkType::Ethernet, &pkt, 10).network(), None);
    }

    #[test]
    fn linux_sll_network_layer() {
        let mut pkt = vec![0u8; 36];
        pkt[14] = 0x86;
        pkt[15] = 0xdd;
        let frame = Frame::new(LinkType::LinuxSll, &pkt, 36);
        assert_eq!(
            frame.network(),
            Some(NetworkLayer {
                proto: ETHERTYPE_IPV6,
                offset: 16
            })
        );
    }

    #[test]
    fn raw_uses_version_nibble() {
        let pkt = [0x45u8, 0, 0, 20];
        let frame = Frame::new(LinkType::Raw, &pkt, 4);
        assert_eq!(frame.network().map(|n| n.proto), Some(ETHERTYPE_IPV4));
        let pkt6 = [0x60u8, 0, 0, 0];
        let frame6 = Frame::new(LinkType::Raw, &pkt6, 4);
        assert_eq!(frame6.network().map(|n| n.proto), Some(ETHERTYPE_IPV6));
    }

    #[test]
    fn null_either_byte_order() {
        let le = [2u8, 0, 0, 0, 0x45];
        assert_eq!(
            Frame::new(LinkType::Null, &le, 5).network().map(|n| n.proto),
            Some(ETHERTYPE_IPV4)
        );
        let be = [0u8, 0, 0, 30, 0x60];
        assert_eq!(
            Frame::new(LinkType::Null, &be, 5).network().map(|n| n.proto),
            Some(ETHERTYPE_IPV6)
        );
    }

    #[test]
    fn load_sizes_and_bounds() {
        let pkt = [0x12u8, 0x34, 0x56, 0x78];
        let frame = Frame::new(LinkType::Other(147), &pkt, 4);
        assert_eq!(frame.load(0, 1), Some(0x12));
        assert_eq!(frame.load(1, 2), Some(0x3456));
        assert_eq!(frame.load(0, 4), Some(0x1234_5678));
        assert_eq!(frame.load(2, 4), None);
        assert_eq!(frame.load(usize::MAX, 2), None);
        assert_eq!(frame.network(), None);
    }

    #[test]
    fn dlt_mapping() {
        assert_eq!(LinkType::from_dlt(1), LinkType::Ethernet);
        assert_eq!(LinkType::from_dlt(113), LinkType::LinuxSll);
        assert_eq!(LinkType::from_dlt(101), LinkType::Raw);
        assert_eq!(LinkType::from_dlt(147), LinkType::Other(147));
    }
}
