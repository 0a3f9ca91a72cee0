//! Filter evaluation against a single frame

use super::ast::{AddrProtos, Arith, ArithOp, Dir, Expr, IpProto, Layer, NetAddr, PortSpec, Primitive, RelOp};
use crate::engine::frame::{
    Frame, LinkType, NetworkLayer, ETHERTYPE_ARP, ETHERTYPE_IPV4, ETHERTYPE_IPV6, ETHERTYPE_RARP,
};

// IPv4 header fields
const IPV4_FRAG_OFFSET: usize = 6;
const IPV4_PROTO_OFFSET: usize = 9;
const IPV4_SRC_OFFSET: usize = 12;
const IPV4_DST_OFFSET: usize = 16;
const IPV4_FRAG_MASK: u32 = 0x1fff;

// IPv6 header fields
const IPV6_NEXT_HDR_OFFSET: usize = 6;
const IPV6_SRC_OFFSET: usize = 8;
const IPV6_DST_OFFSET: usize = 24;
const IPV6_HLEN: usize = 40;

// ARP over Ethernet/IPv4: sender and target protocol addresses
const ARP_SPA_OFFSET: usize = 14;
const ARP_TPA_OFFSET: usize = 24;

const PROTO_TCP: u8 = 6;
const PROTO_UDP: u8 = 17;
const PROTO_SCTP: u8 = 132;

const ETHER_BROADCAST: [u8; 6] = [0xff; 6];

/// Per-frame evaluation state; the network layer is resolved once.
pub struct Ctx<'f, 'a> {
    frame: &'f Frame<'a>,
    net: Option<NetworkLayer>,
}

impl<'f, 'a> Ctx<'f, 'a> {
    pub fn new(frame: &'f Frame<'a>) -> Self {
        Self {
            frame,
            net: frame.network(),
        }
    }

    fn net_of(&self, proto: u16) -> Option<usize> {
        self.net.filter(|n| n.proto == proto).map(|n| n.offset)
    }

    /// Offset of the transport header of a non-fragmented IPv4 packet
    /// carrying one of `protos`.
    fn ipv4_transport(&self, accept: impl Fn(u8) -> bool) -> Option<usize> {
        let net = self.net_of(ETHERTYPE_IPV4)?;
        let proto = self.frame.load(net + IPV4_PROTO_OFFSET, 1)? as u8;
        if !accept(proto) {
            return None;
        }
        let frag = self.frame.load(net + IPV4_FRAG_OFFSET, 2)?;
        if frag & IPV4_FRAG_MASK != 0 {
            return None;
        }
        let ihl = (self.frame.load(net, 1)? & 0x0f) as usize * 4;
        Some(net + ihl)
    }

    fn ipv6_transport(&self, accept: impl Fn(u8) -> bool) -> Option<usize> {
        let net = self.net_of(ETHERTYPE_IPV6)?;
        let next = self.frame.load(net + IPV6_NEXT_HDR_OFFSET, 1)? as u8;
        accept(next).then_some(net + IPV6_HLEN)
    }
}

pub fn eval(expr: &Expr, ctx: &Ctx<'_, '_>) -> bool {
    match expr {
        Expr::True => true,
        Expr::Prim(p) => eval_primitive(p, ctx),
        Expr::Relation { op, lhs, rhs } => match (eval_arith(lhs, ctx), eval_arith(rhs, ctx)) {
            (Some(a), Some(b)) => compare(*op, a, b),
            // Out-of-bounds loads and division by zero reject the packet
            _ => false,
        },
        Expr::Not(inner) => !eval(inner, ctx),
        Expr::And(a, b) => eval(a, ctx) && eval(b, ctx),
        Expr::Or(a, b) => eval(a, ctx) || eval(b, ctx),
    }
}

fn compare(op: RelOp, a: u32, b: u32) -> bool {
    match op {
        RelOp::Eq => a == b,
        RelOp::Ne => a != b,
        RelOp::Lt => a < b,
        RelOp::Le => a <= b,
        RelOp::Gt => a > b,
        RelOp::Ge => a >= b,
    }
}

fn by_dir(dir: Dir, src: bool, dst: bool) -> bool {
    match dir {
        Dir::Src => src,
        Dir::Dst => dst,
        Dir::SrcOrDst => src || dst,
        Dir::SrcAndDst => src && dst,
    }
}

fn eval_primitive(prim: &Primitive, ctx: &Ctx<'_, '_>) -> bool {
    let frame = ctx.frame;
    match prim {
        Primitive::NetProto(proto) => ctx.net.is_some_and(|n| n.proto == *proto),
        Primitive::IpProto(spec) => eval_ip_proto(spec, ctx),
        Primitive::Addr { dir, net, protos } => eval_addr(*dir, net, *protos, ctx),
        Primitive::Port(spec) => eval_port(spec, ctx),
        Primitive::EtherHost { dir, mac } => {
            if frame.link_type != LinkType::Ethernet {
                return false;
            }
            let dst = frame.bytes(0, 6) == Some(&mac[..]);
            let src = frame.bytes(6, 6) == Some(&mac[..]);
            by_dir(*dir, src, dst)
        }
        Primitive::EtherBroadcast => {
            frame.link_type == LinkType::Ethernet && frame.bytes(0, 6) == Some(&ETHER_BROADCAST[..])
        }
        Primitive::Less(n) => frame.wire_len <= *n,
        Primitive::Greater(n) => frame.wire_len >= *n,
    }
}

fn eval_ip_proto(spec: &IpProto, ctx: &Ctx<'_, '_>) -> bool {
    let v4 = spec.v4
        && ctx
            .net_of(ETHERTYPE_IPV4)
            .and_then(|net| ctx.frame.load(net + IPV4_PROTO_OFFSET, 1))
            == Some(u32::from(spec.proto));
    let v6 = spec.v6
        && ctx
            .net_of(ETHERTYPE_IPV6)
            .and_then(|net| ctx.frame.load(net + IPV6_NEXT_HDR_OFFSET, 1))
            == Some(u32::from(spec.proto));
    v4 || v6
}

fn eval_addr(dir: Dir, target: &NetAddr, protos: AddrProtos, ctx: &Ctx<'_, '_>) -> bool {
    let frame = ctx.frame;
    match *target {
        NetAddr::V4 { addr, mask } => {
            let Some(net) = ctx.net else {
                return false;
            };
            let (src_off, dst_off) = match net.proto {
                ETHERTYPE_IPV4 if protos.ip => (IPV4_SRC_OFFSET, IPV4_DST_OFFSET),
                ETHERTYPE_ARP if protos.arp => (ARP_SPA_OFFSET, ARP_TPA_OFFSET),
                ETHERTYPE_RARP if protos.rarp => (ARP_SPA_OFFSET, ARP_TPA_OFFSET),
                _ => return false,
            };
            let hit = |off: usize| {
                frame
                    .load(net.offset + off, 4)
                    .is_some_and(|a| a & mask == addr)
            };
            by_dir(dir, hit(src_off), hit(dst_off))
        }
        NetAddr::V6 { addr, prefix } => {
            let Some(net) = ctx.net_of(ETHERTYPE_IPV6) else {
                return false;
            };
            let hit = |off: usize| {
                frame
                    .bytes(net + off, 16)
                    .is_some_and(|a| prefix_matches(a, &addr, prefix))
            };
            by_dir(dir, hit(IPV6_SRC_OFFSET), hit(IPV6_DST_OFFSET))
        }
    }
}

fn prefix_matches(candidate: &[u8], network: &[u8; 16], prefix: u8) -> bool {
    let full = usize::from(prefix / 8);
    if candidate[..full] != network[..full] {
        return false;
    }
    let rem = prefix % 8;
    if rem == 0 {
        return true;
    }
    let mask = 0xffu8 << (8 - rem);
    candidate[full] & mask == network[full] & mask
}

fn eval_port(spec: &PortSpec, ctx: &Ctx<'_, '_>) -> bool {
    let accept = |p: u8| {
        (spec.tcp && p == PROTO_TCP) || (spec.udp && p == PROTO_UDP) || (spec.sctp && p == PROTO_SCTP)
    };
    let v4 = if spec.v4 { ctx.ipv4_transport(accept) } else { None };
    let transport = v4.or_else(|| if spec.v6 { ctx.ipv6_transport(accept) } else { None });
    let Some(off) = transport else {
        return false;
    };
    let in_range = |v: Option<u32>| {
        v.is_some_and(|p| (u32::from(spec.lo)..=u32::from(spec.hi)).contains(&p))
    };
    by_dir(
        spec.dir,
        in_range(ctx.frame.load(off, 2)),
        in_range(ctx.frame.load(off + 2, 2)),
    )
}

pub fn eval_arith(arith: &Arith, ctx: &Ctx<'_, '_>) -> Option<u32> {
    match arith {
        Arith::Const(v) => Some(*v),
        Arith::Len => Some(ctx.frame.wire_len),
        Arith::Load {
            layer,
            offset,
            size,
        } => {
            let base = match layer {
                Layer::Link => 0,
                Layer::Network(proto) => ctx.net_of(*proto)?,
                Layer::Transport(proto) => ctx.ipv4_transport(|p| p == *proto)?,
            };
            let index = usize::try_from(eval_arith(offset, ctx)?).ok()?;
            ctx.frame.load(base.checked_add(index)?, usize::from(*size))
        }
        Arith::Neg(inner) => Some(eval_arith(inner, ctx)?.wrapping_neg()),
        Arith::Binary { op, lhs, rhs } => {
            let a = eval_arith(lhs, ctx)?;
            let b = eval_arith(rhs, ctx)?;
            match op {
                ArithOp::Add => Some(a.wrapping_add(b)),
                ArithOp::Sub => Some(a.wrapping_sub(b)),
                ArithOp::Mul => Some(a.wrapping_mul(b)),
                ArithOp::Div => a.checked_div(b),
                ArithOp::Mod => a.checked_rem(b),
                ArithOp::And => Some(a & b),
                ArithOp::Or => Some(a | b),
                ArithOp::Xor => Some(a ^ b),
                ArithOp::Shl => Some(a.checked_shl(b).unwrap_or(0)),
                ArithOp::Shr => Some(a.checked_shr(b).unwrap_or(0)),
            }
        }
    }
}
