//! Bounds on parser loops and expression nesting
//!
//! Hostile or truncated input must end in a `ParserLimitExceeded` error,
//! never a hang or a stack overflow.

use super::{ParseError, Parser};
use crate::token::Span;

/// Iterations allowed in a loop without its own limit
const DEFAULT_ITERATIONS: usize = 10_000;

/// Deepest expression nesting accepted
pub const MAX_PARSE_DEPTH: usize = 64;

/// Iteration budget of one parser loop.
pub struct LoopGuard {
    what: &'static str,
    remaining: usize,
    limit: usize,
}

impl LoopGuard {
    #[inline]
    pub fn new(what: &'static str) -> Self {
        Self::with_limit(what, DEFAULT_ITERATIONS)
    }

    #[inline]
    pub fn with_limit(what: &'static str, limit: usize) -> Self {
        Self {
            what,
            remaining: limit,
            limit,
        }
    }

    /// Spend one iteration.
    #[inline]
    pub fn check(&mut self) -> Result<(), ParseError> {
        match self.remaining.checked_sub(1) {
            Some(remaining) => {
                self.remaining = remaining;
                Ok(())
            }
            None => Err(ParseError::parser_limit_exceeded(
                format!("more than {} {} entries", self.limit, self.what),
                Span::default(),
            )),
        }
    }
}

/// Run `f` one nesting level deeper.
///
/// The depth counter lives on the parser, so the guard is a scope around a
/// closure rather than an RAII value holding `&mut parser.depth`.
pub fn nested<T>(
    parser: &mut Parser,
    name: &'static str,
    f: impl FnOnce(&mut Parser) -> Result<T, ParseError>,
) -> Result<T, ParseError> {
    if parser.depth >= MAX_PARSE_DEPTH {
        return Err(ParseError::parser_limit_exceeded(
            format!("{} nested deeper than {} levels", name, MAX_PARSE_DEPTH),
            parser.current_span(),
        ));
    }
    parser.depth += 1;
    let result = f(parser);
    parser.depth -= 1;
    result
}
