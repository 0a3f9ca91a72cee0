//! Recursive-descent parser for pcap-filter expressions
//!
//! Boolean operators bind `not` > `and` > `or`. A parenthesis may open
//! either a boolean group or an arithmetic operand, so relations are tried
//! first and the parser backtracks when no comparison operator follows.

use std::net::{Ipv4Addr, Ipv6Addr};

use super::ast::{
    AddrProtos, Arith, ArithOp, Dir, Expr, IpProto, Layer, NetAddr, PortSpec, Primitive, RelOp,
};
use super::lexer::Token;
use crate::engine::frame::{ETHERTYPE_ARP, ETHERTYPE_IPV4, ETHERTYPE_IPV6, ETHERTYPE_RARP};

const PROTO_ICMP: u8 = 1;
const PROTO_TCP: u8 = 6;
const PROTO_UDP: u8 = 17;
const PROTO_ICMPV6: u8 = 58;
const PROTO_SCTP: u8 = 132;

/// Deepest allowed nesting of groups, negations and index operands
const MAX_NESTING: usize = 64;

/// Protocol qualifier preceding a primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProtoQ {
    Ether,
    Ip,
    Ip6,
    Arp,
    Rarp,
    Tcp,
    Udp,
    Sctp,
    Icmp,
    Icmp6,
}

impl ProtoQ {
    fn from_word(w: &str) -> Option<Self> {
        Some(match w {
            "ether" => ProtoQ::Ether,
            "ip" => ProtoQ::Ip,
            "ip6" => ProtoQ::Ip6,
            "arp" => ProtoQ::Arp,
            "rarp" => ProtoQ::Rarp,
            "tcp" => ProtoQ::Tcp,
            "udp" => ProtoQ::Udp,
            "sctp" => ProtoQ::Sctp,
            "icmp" => ProtoQ::Icmp,
            "icmp6" => ProtoQ::Icmp6,
            _ => return None,
        })
    }

    fn name(self) -> &'static str {
        match self {
            ProtoQ::Ether => "ether",
            ProtoQ::Ip => "ip",
            ProtoQ::Ip6 => "ip6",
            ProtoQ::Arp => "arp",
            ProtoQ::Rarp => "rarp",
            ProtoQ::Tcp => "tcp",
            ProtoQ::Udp => "udp",
            ProtoQ::Sctp => "sctp",
            ProtoQ::Icmp => "icmp",
            ProtoQ::Icmp6 => "icmp6",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Host,
    Net,
    Port,
    Portrange,
}

impl Kind {
    fn from_word(w: &str) -> Option<Self> {
        Some(match w {
            "host" => Kind::Host,
            "net" => Kind::Net,
            "port" => Kind::Port,
            "portrange" => Kind::Portrange,
            _ => return None,
        })
    }
}

/// Qualifiers of the most recent primitive; reused by a bare value after
/// `and`/`or` (`port 80 or 443`).
#[derive(Debug, Clone, Copy, Default)]
struct Qualifiers {
    proto: Option<ProtoQ>,
    dir: Option<Dir>,
    kind: Option<Kind>,
}

#[derive(Debug)]
struct ParseError {
    pos: usize,
    msg: String,
}

type PResult<T> = std::result::Result<T, ParseError>;

/// Parse a token stream into an expression; no tokens means match-all.
pub fn parse(tokens: Vec<Token>) -> Result<Expr, String> {
    if tokens.is_empty() {
        return Ok(Expr::True);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        last: None,
        depth: 0,
        too_deep: false,
    };
    let expr = parser.parse_or().map_err(|e| e.msg)?;
    if let Some(tok) = parser.peek() {
        return Err(format!("unexpected {} after complete expression", tok));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    last: Option<Qualifiers>,
    depth: usize,
    /// Set once `MAX_NESTING` is exceeded; no alternative reading can recover
    too_deep: bool,
}

impl Parser {
    // === Token helpers ===

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead)
    }

    fn peek_word(&self) -> Option<&str> {
        match self.peek() {
            Some(Token::Word(w)) => Some(w.as_str()),
            _ => None,
        }
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.peek_word() == Some(word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> PResult<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected {}", expected)))
        }
    }

    fn error<S: Into<String>>(&self, msg: S) -> ParseError {
        ParseError {
            pos: self.pos,
            msg: msg.into(),
        }
    }

    /// Run `inner` one nesting level deeper.
    fn nested<T>(&mut self, inner: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.depth >= MAX_NESTING {
            self.too_deep = true;
            return Err(self.error("expression nested too deeply"));
        }
        self.depth += 1;
        let result = inner(self);
        self.depth -= 1;
        result
    }

    fn unexpected(&self, context: &str) -> ParseError {
        match self.peek() {
            Some(tok) => self.error(format!("{}, found {}", context, tok)),
            None => self.error(format!("{}, found end of expression", context)),
        }
    }

    // === Boolean structure ===

    fn parse_or(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_and()?;
        while self.eat_word("or") || self.eat(&Token::OrOr) {
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_not()?;
        while self.eat_word("and") || self.eat(&Token::AndAnd) {
            let rhs = self.parse_not()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> PResult<Expr> {
        if self.eat_word("not") || self.eat(&Token::Bang) {
            let inner = self.nested(|p| p.parse_not())?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        let start = self.pos;
        let relation_err = match self.parse_relation() {
            Ok(expr) => return Ok(expr),
            Err(e) if self.too_deep => return Err(e),
            Err(e) => e,
        };
        self.pos = start;

        match self.parse_group_or_primitive() {
            Ok(expr) => Ok(expr),
            Err(e) if self.too_deep => Err(e),
            // Report whichever reading got further into the input
            Err(e) if relation_err.pos > e.pos => Err(relation_err),
            Err(e) => Err(e),
        }
    }

    fn parse_group_or_primitive(&mut self) -> PResult<Expr> {
        if self.eat(&Token::LParen) {
            return self.nested(|p| {
                let expr = p.parse_or()?;
                p.expect(&Token::RParen)?;
                Ok(expr)
            });
        }
        self.parse_primitive()
    }

    // === Relations and arithmetic ===

    fn parse_relation(&mut self) -> PResult<Expr> {
        let lhs = self.parse_arith()?;
        let op = match self.peek() {
            Some(Token::Eq) => RelOp::Eq,
            Some(Token::Ne) => RelOp::Ne,
            Some(Token::Lt) => RelOp::Lt,
            Some(Token::Le) => RelOp::Le,
            Some(Token::Gt) => RelOp::Gt,
            Some(Token::Ge) => RelOp::Ge,
            _ => return Err(self.unexpected("expected comparison operator")),
        };
        self.pos += 1;
        let rhs = self.parse_arith()?;
        Ok(Expr::Relation { op, lhs, rhs })
    }

    fn parse_arith(&mut self) -> PResult<Arith> {
        self.parse_binary(0)
    }

    /// Precedence levels, lowest first: `| ^`, `&`, `<< >>`, `+ -`, `* / %`
    fn parse_binary(&mut self, level: usize) -> PResult<Arith> {
        const LEVELS: usize = 5;
        if level == LEVELS {
            return self.parse_unary();
        }
        let mut lhs = self.parse_binary(level + 1)?;
        while let Some(op) = self.peek().and_then(|t| binary_op(t, level)) {
            self.pos += 1;
            let rhs = self.parse_binary(level + 1)?;
            lhs = Arith::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> PResult<Arith> {
        if self.eat(&Token::Minus) {
            let inner = self.nested(|p| p.parse_unary())?;
            return Ok(Arith::Neg(Box::new(inner)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> PResult<Arith> {
        match self.peek().cloned() {
            Some(Token::Num(n)) => {
                self.pos += 1;
                Ok(Arith::Const(n))
            }
            Some(Token::LParen) => {
                self.pos += 1;
                self.nested(|p| {
                    let inner = p.parse_arith()?;
                    p.expect(&Token::RParen)?;
                    Ok(inner)
                })
            }
            Some(Token::Word(w)) => {
                if w == "len" {
                    self.pos += 1;
                    return Ok(Arith::Len);
                }
                if let Some(value) = named_constant(&w) {
                    self.pos += 1;
                    return Ok(Arith::Const(value));
                }
                match (load_layer(&w), self.peek_at(1)) {
                    (Some(layer), Some(Token::LBracket)) => {
                        self.pos += 2;
                        self.nested(|p| p.parse_load(layer))
                    }
                    _ => Err(self.unexpected("expected arithmetic expression")),
                }
            }
            _ => Err(self.unexpected("expected arithmetic expression")),
        }
    }

    fn parse_load(&mut self, layer: Layer) -> PResult<Arith> {
        let offset = self.parse_arith()?;
        let size = if self.eat(&Token::Colon) {
            match self.peek() {
                Some(Token::Num(n @ (1 | 2 | 4))) => {
                    let n = *n as u8;
                    self.pos += 1;
                    n
                }
                _ => return Err(self.error("index size must be 1, 2 or 4")),
            }
        } else {
            1
        };
        self.expect(&Token::RBracket)?;
        Ok(Arith::Load {
            layer,
            offset: Box::new(offset),
            size,
        })
    }

    // === Primitives ===

    fn parse_primitive(&mut self) -> PResult<Expr> {
        let word = match self.peek() {
            Some(Token::Word(w)) => w.clone(),
            Some(Token::Num(_)) => return self.parse_bare_id(),
            _ => return Err(self.unexpected("expected filter primitive")),
        };

        match word.as_str() {
            "less" | "greater" => {
                self.pos += 1;
                let n = self.expect_number()?;
                return Ok(Expr::Prim(if word == "less" {
                    Primitive::Less(n)
                } else {
                    Primitive::Greater(n)
                }));
            }
            "broadcast" => {
                self.pos += 1;
                return Ok(Expr::Prim(Primitive::EtherBroadcast));
            }
            "proto" => {
                self.pos += 1;
                let proto = self.expect_ip_proto()?;
                return Ok(Expr::Prim(Primitive::IpProto(IpProto {
                    proto,
                    v4: true,
                    v6: true,
                })));
            }
            _ => {}
        }

        let mut q = Qualifiers::default();

        if let Some(proto) = ProtoQ::from_word(&word) {
            self.pos += 1;
            q.proto = Some(proto);

            // `ip[...]` only ever starts an arithmetic operand
            if self.peek() == Some(&Token::LBracket) {
                return Err(self.unexpected("expected comparison after index"));
            }
            if self.eat_word("proto") {
                return self.finish_proto(proto);
            }
            if proto == ProtoQ::Ether && self.eat_word("broadcast") {
                return Ok(Expr::Prim(Primitive::EtherBroadcast));
            }
        }

        q.dir = self.parse_dir();

        if let Some(kind) = self.peek_word().and_then(Kind::from_word) {
            self.pos += 1;
            q.kind = Some(kind);
        }

        if q.dir.is_none() && q.kind.is_none() {
            return match q.proto {
                Some(proto) => self.proto_only(proto),
                None => self.parse_bare_id(),
            };
        }

        self.last = Some(q);
        self.finish_id(q)
    }

    /// A value with no qualifiers of its own
    fn parse_bare_id(&mut self) -> PResult<Expr> {
        let q = self.last.unwrap_or_default();
        self.finish_id(q)
    }

    fn parse_dir(&mut self) -> Option<Dir> {
        let first = match self.peek_word() {
            Some("src") => Dir::Src,
            Some("dst") => Dir::Dst,
            _ => return None,
        };
        self.pos += 1;

        let other = if first == Dir::Src { "dst" } else { "src" };
        if matches!(self.peek_at(1), Some(Token::Word(w)) if w == other) {
            let combined = match self.peek() {
                Some(Token::Word(w)) if w == "or" => Some(Dir::SrcOrDst),
                Some(Token::OrOr) => Some(Dir::SrcOrDst),
                Some(Token::Word(w)) if w == "and" => Some(Dir::SrcAndDst),
                Some(Token::AndAnd) => Some(Dir::SrcAndDst),
                _ => None,
            };
            if let Some(dir) = combined {
                self.pos += 2;
                return Some(dir);
            }
        }
        Some(first)
    }

    fn proto_only(&self, proto: ProtoQ) -> PResult<Expr> {
        let prim = match proto {
            ProtoQ::Ether => return Err(self.unexpected("'ether' needs a qualifier")),
            ProtoQ::Ip => Primitive::NetProto(ETHERTYPE_IPV4),
            ProtoQ::Ip6 => Primitive::NetProto(ETHERTYPE_IPV6),
            ProtoQ::Arp => Primitive::NetProto(ETHERTYPE_ARP),
            ProtoQ::Rarp => Primitive::NetProto(ETHERTYPE_RARP),
            ProtoQ::Tcp => ip_proto(PROTO_TCP, true, true),
            ProtoQ::Udp => ip_proto(PROTO_UDP, true, true),
            ProtoQ::Sctp => ip_proto(PROTO_SCTP, true, true),
            ProtoQ::Icmp => ip_proto(PROTO_ICMP, true, false),
            ProtoQ::Icmp6 => ip_proto(PROTO_ICMPV6, false, true),
        };
        Ok(Expr::Prim(prim))
    }

    fn finish_proto(&mut self, proto: ProtoQ) -> PResult<Expr> {
        let prim = match proto {
            ProtoQ::Ip => ip_proto(self.expect_ip_proto()?, true, false),
            ProtoQ::Ip6 => ip_proto(self.expect_ip_proto()?, false, true),
            ProtoQ::Ether => {
                let value = match self.peek() {
                    Some(Token::Num(n)) => u16::try_from(*n).ok(),
                    Some(Token::Word(w)) => match w.as_str() {
                        "ip" => Some(ETHERTYPE_IPV4),
                        "ip6" => Some(ETHERTYPE_IPV6),
                        "arp" => Some(ETHERTYPE_ARP),
                        "rarp" => Some(ETHERTYPE_RARP),
                        _ => None,
                    },
                    _ => None,
                };
                match value {
                    Some(v) => {
                        self.pos += 1;
                        Primitive::NetProto(v)
                    }
                    None => return Err(self.unexpected("expected EtherType")),
                }
            }
            other => {
                return Err(self.error(format!("'proto' is not valid after '{}'", other.name())))
            }
        };
        Ok(Expr::Prim(prim))
    }

    fn expect_number(&mut self) -> PResult<u32> {
        match self.peek() {
            Some(Token::Num(n)) => {
                let n = *n;
                self.pos += 1;
                Ok(n)
            }
            _ => Err(self.unexpected("expected number")),
        }
    }

    fn expect_ip_proto(&mut self) -> PResult<u8> {
        let value = match self.peek() {
            Some(Token::Num(n)) => u8::try_from(*n).ok(),
            Some(Token::Word(w)) => protocol_number(w),
            _ => None,
        };
        match value {
            Some(v) => {
                self.pos += 1;
                Ok(v)
            }
            None => Err(self.unexpected("expected IP protocol")),
        }
    }

    // === Values ===

    fn finish_id(&mut self, q: Qualifiers) -> PResult<Expr> {
        let dir = q.dir.unwrap_or_default();
        match q.kind.unwrap_or(Kind::Host) {
            Kind::Host => self.finish_host(q.proto, dir),
            Kind::Net => self.finish_net(q.proto, dir),
            Kind::Port => {
                let port = self.expect_port()?;
                self.port_primitive(q.proto, dir, port, port)
            }
            Kind::Portrange => {
                let lo = self.expect_port()?;
                self.expect(&Token::Minus)?;
                let hi = self.expect_port()?;
                self.port_primitive(q.proto, dir, lo.min(hi), lo.max(hi))
            }
        }
    }

    fn finish_host(&mut self, proto: Option<ProtoQ>, dir: Dir) -> PResult<Expr> {
        let at = self.pos;
        let text = match self.advance() {
            Some(Token::Word(w)) => w,
            Some(Token::Num(n)) => {
                self.pos = at;
                return Err(self.error(format!("'{}' is not a host address", n)));
            }
            _ => {
                self.pos = at;
                return Err(self.unexpected("expected host address"));
            }
        };

        if proto == Some(ProtoQ::Ether) {
            let mac = parse_mac(&text).ok_or_else(|| ParseError {
                pos: at,
                msg: format!("invalid MAC address '{}'", text),
            })?;
            return Ok(Expr::Prim(Primitive::EtherHost { dir, mac }));
        }

        if let Ok(v4) = text.parse::<Ipv4Addr>() {
            let net = NetAddr::V4 {
                addr: u32::from(v4),
                mask: u32::MAX,
            };
            return self.addr_primitive(proto, dir, net, at);
        }
        if let Ok(v6) = text.parse::<Ipv6Addr>() {
            let net = NetAddr::V6 {
                addr: v6.octets(),
                prefix: 128,
            };
            return self.addr_primitive(proto, dir, net, at);
        }

        Err(ParseError {
            pos: at,
            msg: format!("unknown host '{}' (host names are not resolved)", text),
        })
    }

    fn finish_net(&mut self, proto: Option<ProtoQ>, dir: Dir) -> PResult<Expr> {
        let at = self.pos;
        let net = match self.advance() {
            Some(Token::Num(n)) => {
                let (addr, mask) = numeric_network(n);
                self.v4_network(addr, mask, at)?
            }
            Some(Token::Word(w)) => {
                if let Some((addr, mask)) = partial_ipv4(&w) {
                    self.v4_network(addr, mask, at)?
                } else if let Ok(v6) = w.parse::<Ipv6Addr>() {
                    let prefix = if self.eat(&Token::Slash) {
                        match self.expect_number()? {
                            len @ 0..=128 => len as u8,
                            len => {
                                return Err(self.error(format!("IPv6 prefix length {} out of range", len)))
                            }
                        }
                    } else {
                        128
                    };
                    NetAddr::V6 {
                        addr: v6.octets(),
                        prefix,
                    }
                } else {
                    return Err(ParseError {
                        pos: at,
                        msg: format!("invalid network '{}'", w),
                    });
                }
            }
            _ => {
                self.pos = at;
                return Err(self.unexpected("expected network address"));
            }
        };
        self.addr_primitive(proto, dir, net, at)
    }

    /// Apply an optional `mask a.b.c.d` or `/len` to an IPv4 network.
    fn v4_network(&mut self, addr: u32, implied_mask: u32, at: usize) -> PResult<NetAddr> {
        let mask = if self.eat_word("mask") {
            let mask_at = self.pos;
            match self.advance() {
                Some(Token::Word(w)) => match w.parse::<Ipv4Addr>() {
                    Ok(m) => u32::from(m),
                    Err(_) => {
                        return Err(ParseError {
                            pos: mask_at,
                            msg: format!("invalid netmask '{}'", w),
                        })
                    }
                },
                _ => {
                    self.pos = mask_at;
                    return Err(self.unexpected("expected netmask"));
                }
            }
        } else if self.eat(&Token::Slash) {
            match self.expect_number()? {
                0 => 0,
                len @ 1..=32 => u32::MAX << (32 - len),
                len => return Err(self.error(format!("prefix length {} out of range", len))),
            }
        } else {
            implied_mask
        };

        if addr & !mask != 0 {
            return Err(ParseError {
                pos: at,
                msg: format!("non-network bits set in \"{}\"", Ipv4Addr::from(addr)),
            });
        }
        Ok(NetAddr::V4 { addr, mask })
    }

    fn addr_primitive(
        &self,
        proto: Option<ProtoQ>,
        dir: Dir,
        net: NetAddr,
        at: usize,
    ) -> PResult<Expr> {
        let is_v6 = matches!(net, NetAddr::V6 { .. });
        let protos = match (proto, is_v6) {
            (None, false) => AddrProtos::ALL,
            (Some(ProtoQ::Ip), false) => AddrProtos::IP,
            (Some(ProtoQ::Arp), false) => AddrProtos::ARP,
            (Some(ProtoQ::Rarp), false) => AddrProtos::RARP,
            (None, true) | (Some(ProtoQ::Ip6), true) => AddrProtos::IP,
            (Some(p), _) => {
                return Err(ParseError {
                    pos: at,
                    msg: format!("'{}' modifier does not apply to this address", p.name()),
                })
            }
        };
        Ok(Expr::Prim(Primitive::Addr { dir, net, protos }))
    }

    fn expect_port(&mut self) -> PResult<u16> {
        let value = match self.peek() {
            Some(Token::Num(n)) => u16::try_from(*n).ok(),
            Some(Token::Word(w)) => service_port(w),
            _ => None,
        };
        match value {
            Some(port) => {
                self.pos += 1;
                Ok(port)
            }
            None => Err(self.unexpected("expected port number")),
        }
    }

    fn port_primitive(&self, proto: Option<ProtoQ>, dir: Dir, lo: u16, hi: u16) -> PResult<Expr> {
        let mut spec = PortSpec {
            dir,
            lo,
            hi,
            tcp: true,
            udp: true,
            sctp: true,
            v4: true,
            v6: true,
        };
        match proto {
            None => {}
            Some(ProtoQ::Tcp) => {
                spec.udp = false;
                spec.sctp = false;
            }
            Some(ProtoQ::Udp) => {
                spec.tcp = false;
                spec.sctp = false;
            }
            Some(ProtoQ::Sctp) => {
                spec.tcp = false;
                spec.udp = false;
            }
            Some(ProtoQ::Ip) => spec.v6 = false,
            Some(ProtoQ::Ip6) => spec.v4 = false,
            Some(other) => {
                return Err(self.error(format!("'{}' modifier applied to port", other.name())))
            }
        }
        Ok(Expr::Prim(Primitive::Port(spec)))
    }
}

fn binary_op(token: &Token, level: usize) -> Option<ArithOp> {
    Some(match (level, token) {
        (0, Token::Pipe) => ArithOp::Or,
        (0, Token::Caret) => ArithOp::Xor,
        (1, Token::Amp) => ArithOp::And,
        (2, Token::Shl) => ArithOp::Shl,
        (2, Token::Shr) => ArithOp::Shr,
        (3, Token::Plus) => ArithOp::Add,
        (3, Token::Minus) => ArithOp::Sub,
        (4, Token::Star) => ArithOp::Mul,
        (4, Token::Slash) => ArithOp::Div,
        (4, Token::Percent) => ArithOp::Mod,
        _ => return None,
    })
}

fn ip_proto(proto: u8, v4: bool, v6: bool) -> Primitive {
    Primitive::IpProto(IpProto { proto, v4, v6 })
}

fn load_layer(word: &str) -> Option<Layer> {
    Some(match word {
        "ether" | "link" => Layer::Link,
        "ip" => Layer::Network(ETHERTYPE_IPV4),
        "ip6" => Layer::Network(ETHERTYPE_IPV6),
        "arp" => Layer::Network(ETHERTYPE_ARP),
        "rarp" => Layer::Network(ETHERTYPE_RARP),
        "tcp" => Layer::Transport(PROTO_TCP),
        "udp" => Layer::Transport(PROTO_UDP),
        "icmp" => Layer::Transport(PROTO_ICMP),
        "sctp" => Layer::Transport(PROTO_SCTP),
        _ => return None,
    })
}

/// Field offsets and flag values usable inside arithmetic.
fn named_constant(word: &str) -> Option<u32> {
    Some(match word {
        "icmptype" => 0,
        "icmpcode" => 1,
        "tcpflags" => 13,
        "tcp-fin" => 0x01,
        "tcp-syn" => 0x02,
        "tcp-rst" => 0x04,
        "tcp-push" => 0x08,
        "tcp-ack" => 0x10,
        "tcp-urg" => 0x20,
        "tcp-ece" => 0x40,
        "tcp-cwr" => 0x80,
        "icmp-echoreply" => 0,
        "icmp-unreach" => 3,
        "icmp-sourcequench" => 4,
        "icmp-redirect" => 5,
        "icmp-echo" => 8,
        "icmp-routeradvert" => 9,
        "icmp-routersolicit" => 10,
        "icmp-timxceed" => 11,
        "icmp-paramprob" => 12,
        "icmp-tstamp" => 13,
        "icmp-tstampreply" => 14,
        "icmp-ireq" => 15,
        "icmp-ireqreply" => 16,
        "icmp-maskreq" => 17,
        "icmp-maskreply" => 18,
        _ => return None,
    })
}

fn protocol_number(name: &str) -> Option<u8> {
    Some(match name {
        "icmp" => PROTO_ICMP,
        "igmp" => 2,
        "tcp" => PROTO_TCP,
        "udp" => PROTO_UDP,
        "gre" => 47,
        "esp" => 50,
        "ah" => 51,
        "icmp6" => PROTO_ICMPV6,
        "sctp" => PROTO_SCTP,
        _ => return None,
    })
}

fn service_port(name: &str) -> Option<u16> {
    Some(match name {
        "ftp" => 21,
        "ssh" => 22,
        "telnet" => 23,
        "smtp" => 25,
        "domain" => 53,
        "bootps" => 67,
        "bootpc" => 68,
        "tftp" => 69,
        "http" => 80,
        "ntp" => 123,
        "snmp" => 161,
        "https" => 443,
        _ => return None,
    })
}

/// `net 10` means 10.0.0.0/8: shift the value up to the top octets.
fn numeric_network(value: u32) -> (u32, u32) {
    let mut addr = value;
    let mut mask = u32::MAX;
    while addr != 0 && addr & 0xff00_0000 == 0 {
        addr <<= 8;
        mask <<= 8;
    }
    (addr, mask)
}

/// Dotted network with one to four octets; the mask covers the octets given.
fn partial_ipv4(text: &str) -> Option<(u32, u32)> {
    let parts: Vec<&str> = text.split('.').collect();
    if parts.is_empty() || parts.len() > 4 {
        return None;
    }
    let mut addr = 0u32;
    for part in &parts {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        addr = (addr << 8) | u32::from(part.parse::<u8>().ok()?);
    }
    let missing = 4 - parts.len() as u32;
    let addr = addr.checked_shl(8 * missing).unwrap_or(0);
    let mask = u32::MAX.checked_shl(8 * missing).unwrap_or(0);
    Some((addr, mask))
}

fn parse_mac(text: &str) -> Option<[u8; 6]> {
    let mut mac = [0u8; 6];
    let mut count = 0;
    for part in text.split(':') {
        if count == 6 || part.is_empty() || part.len() > 2 {
            return None;
        }
        mac[count] = u8::from_str_radix(part, 16).ok()?;
        count += 1;
    }
    (count == 6).then_some(mac)
}
