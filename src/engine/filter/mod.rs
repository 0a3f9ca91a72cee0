//! Native pcap-filter compiler
//!
//! Compiles the commonly used subset of the tcpdump filter language into an
//! expression tree that is evaluated directly against each frame:
//!
//! - protocols: `ip`, `ip6`, `arp`, `rarp`, `tcp`, `udp`, `sctp`, `icmp`, `icmp6`
//! - `[src|dst|src or dst|src and dst] host|net|port|portrange <id>`
//! - `ether host|src|dst <mac>`, `ether broadcast`, `ether proto <n>`
//! - `ip proto <n>`, `ip6 proto <n>`, `less <n>`, `greater <n>`
//! - relations over `proto[offset:size]`, `len` and integer arithmetic
//! - `and`/`&&`, `or`/`||`, `not`/`!` and parentheses
//!
//! Host names are never resolved; only numeric addresses are accepted.

mod ast;
mod eval;
mod lexer;
mod parser;

use super::{FilterCompiler, Frame, Matcher};
use crate::common::{Error, Result};

pub use ast::Expr;

/// [`FilterCompiler`] for the built-in filter language
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeCompiler;

impl NativeCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Parse `expression` without wrapping it in a matcher.
    pub fn parse(&self, expression: &str) -> Result<Expr> {
        let tokens = lexer::tokenize(expression).map_err(Error::Compile)?;
        parser::parse(tokens).map_err(Error::Compile)
    }
}

impl FilterCompiler for NativeCompiler {
    fn compile(&self, expression: &str) -> Result<Box<dyn Matcher>> {
        let expr = self.parse(expression)?;
        tracing::trace!(expression, ?expr, "filter compiled");
        Ok(Box::new(CompiledFilter { expr }))
    }
}

/// A parsed filter ready for matching
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    expr: Expr,
}

impl Matcher for CompiledFilter {
    fn matches(&self, frame: &Frame<'_>) -> bool {
        eval::eval(&self.expr, &eval::Ctx::new(frame))
    }
}
