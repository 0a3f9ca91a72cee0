//! Compiled filter representation

/// Direction qualifier for address and port primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dir {
    Src,
    Dst,
    #[default]
    SrcOrDst,
    SrcAndDst,
}

/// Network protocols an IPv4 address primitive applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddrProtos {
    pub ip: bool,
    pub arp: bool,
    pub rarp: bool,
}

impl AddrProtos {
    pub const ALL: Self = Self {
        ip: true,
        arp: true,
        rarp: true,
    };
    pub const IP: Self = Self {
        ip: true,
        arp: false,
        rarp: false,
    };
    pub const ARP: Self = Self {
        ip: false,
        arp: true,
        rarp: false,
    };
    pub const RARP: Self = Self {
        ip: false,
        arp: false,
        rarp: true,
    };
}

/// Address with a network mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetAddr {
    V4 { addr: u32, mask: u32 },
    V6 { addr: [u8; 16], prefix: u8 },
}

/// IP protocol test, optionally limited to one IP version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpProto {
    pub proto: u8,
    pub v4: bool,
    pub v6: bool,
}

/// Transport protocols a port primitive applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSpec {
    pub dir: Dir,
    pub lo: u16,
    pub hi: u16,
    pub tcp: bool,
    pub udp: bool,
    pub sctp: bool,
    pub v4: bool,
    pub v6: bool,
}

/// Leaf predicates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Primitive {
    /// Network-layer protocol (EtherType) equals the value
    NetProto(u16),
    IpProto(IpProto),
    /// IPv4/ARP/RARP or IPv6 address match
    Addr {
        dir: Dir,
        net: NetAddr,
        protos: AddrProtos,
    },
    Port(PortSpec),
    EtherHost { dir: Dir, mac: [u8; 6] },
    EtherBroadcast,
    /// Wire length at most the value
    Less(u32),
    /// Wire length at least the value
    Greater(u32),
}

/// Base of an indexed load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// Start of the frame (`ether[]`, `link[]`)
    Link,
    /// Network header of the given EtherType (`ip[]`, `ip6[]`, `arp[]`)
    Network(u16),
    /// Transport header over non-fragmented IPv4 (`tcp[]`, `udp[]`, `icmp[]`)
    Transport(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arith {
    Const(u32),
    /// Packet length on the wire
    Len,
    Load {
        layer: Layer,
        offset: Box<Arith>,
        size: u8,
    },
    Neg(Box<Arith>),
    Binary {
        op: ArithOp,
        lhs: Box<Arith>,
        rhs: Box<Arith>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Matches everything (empty filter)
    True,
    Prim(Primitive),
    Relation { op: RelOp, lhs: Arith, rhs: Arith },
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}
