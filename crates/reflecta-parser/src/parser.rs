//! Parser for declaration source files
//!
//! A recursive descent parser over a pre-tokenized stream. Declarations are
//! parsed structurally; function and method bodies are skipped by matching
//! braces. Expressions use precedence climbing (see `precedence`).

pub mod decl;
pub mod error;
pub mod expr;
pub mod guards;
pub mod precedence;
pub mod recovery;

use crate::ast::*;
use crate::interner::{Interner, Symbol};
use crate::lexer::{LexError, Lexer};
use crate::token::{Span, Token};
use rustc_hash::FxHashMap;

pub use error::{ParseError, ParseErrorKind};

/// Parser state.
pub struct Parser {
    /// Pre-tokenized input, documentation comments removed
    tokens: Vec<(Token, Span)>,

    /// Documentation comment immediately preceding the token at an index
    docs: FxHashMap<usize, DocComment>,

    /// Current position in token stream
    pos: usize,

    /// Accumulated parse errors (allows continuing after errors)
    errors: Vec<ParseError>,

    interner: Interner,

    /// Source text, for names whose spelling the tokens do not keep
    source: String,

    /// Current expression nesting depth
    pub(crate) depth: usize,
}

impl Parser {
    /// Create a new parser from source code.
    pub fn new(source: &str) -> Result<Self, Vec<LexError>> {
        let (raw, interner) = Lexer::new(source).tokenize()?;

        let mut tokens = Vec::with_capacity(raw.len());
        let mut docs = FxHashMap::default();
        for (token, span) in raw {
            match token {
                // The last comment before a token wins
                Token::DocComment(text) => {
                    docs.insert(tokens.len(), DocComment { text, span });
                }
                other => tokens.push((other, span)),
            }
        }

        Ok(Self {
            tokens,
            docs,
            pos: 0,
            errors: Vec::new(),
            interner,
            source: source.to_string(),
            depth: 0,
        })
    }

    /// Parse the entire source file.
    ///
    /// Returns the file and its interner on success, or all accumulated
    /// errors on failure.
    pub fn parse(mut self) -> Result<(SourceFile, Interner), Vec<ParseError>> {
        let start_span = self.current_span();
        let blocks = decl::parse_source_file(&mut self);
        let span = start_span.to(&self.current_span());

        if !self.errors.is_empty() {
            return Err(self.errors);
        }

        Ok((SourceFile { blocks, span }, self.interner))
    }

    // ========================================================================
    // Token Management
    // ========================================================================

    /// Get the current token.
    #[inline]
    pub fn current(&self) -> &Token {
        &self.tokens[self.pos].0
    }

    /// Get the current token's span.
    #[inline]
    pub fn current_span(&self) -> Span {
        self.tokens[self.pos].1
    }

    /// Peek at the next token (lookahead).
    #[inline]
    pub fn peek(&self) -> Option<&Token> {
        self.peek_nth(1)
    }

    /// Peek `n` tokens ahead of the current one.
    #[inline]
    pub fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|(tok, _)| tok)
    }

    /// Span of the token before the current one.
    pub fn previous_span(&self) -> Span {
        if self.pos == 0 {
            self.current_span()
        } else {
            self.tokens[self.pos - 1].1
        }
    }

    /// Advance to the next token, returning the previous current token.
    pub fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].0.clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    /// Check if the current token matches the given kind.
    #[inline]
    pub fn check(&self, expected: &Token) -> bool {
        std::mem::discriminant(self.current()) == std::mem::discriminant(expected)
    }

    /// Check if the current token matches any of the given kinds.
    pub fn check_any(&self, expected: &[Token]) -> bool {
        expected.iter().any(|tok| self.check(tok))
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Check if we've reached EOF.
    #[inline]
    pub fn at_eof(&self) -> bool {
        matches!(self.current(), Token::Eof)
    }

    /// Consume the current token if it matches the expected kind.
    pub fn expect(&mut self, expected: Token) -> Result<Token, ParseError> {
        if self.check(&expected) {
            Ok(self.advance())
        } else {
            Err(self.unexpected_token(&[expected]))
        }
    }

    /// Consume the current token if it matches any of the expected kinds.
    pub fn expect_any(&mut self, expected: &[Token]) -> Result<Token, ParseError> {
        if self.check_any(expected) {
            Ok(self.advance())
        } else {
            Err(self.unexpected_token(expected))
        }
    }

    /// Documentation comment attached to the current token, if any.
    pub fn doc_comment(&self) -> Option<DocComment> {
        self.docs.get(&self.pos).copied()
    }

    /// Current token position, for lookahead checks.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    // ========================================================================
    // Names
    // ========================================================================

    pub fn resolve(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }

    pub fn intern(&mut self, s: &str) -> Symbol {
        self.interner.intern(s)
    }

    /// Whether the current token is the identifier `text` (case-insensitive).
    pub fn check_word(&self, text: &str) -> bool {
        match self.current() {
            Token::Identifier(sym) => self.resolve(*sym).eq_ignore_ascii_case(text),
            _ => false,
        }
    }

    /// Consume an identifier, accepting keywords (member names may be
    /// reserved words).
    pub fn expect_member_name(&mut self) -> Result<Identifier, ParseError> {
        let span = self.current_span();
        let name = match self.current().clone() {
            Token::Identifier(sym) => sym,
            other if other.is_keyword() => {
                let text = self.current_span().slice(&self.source).to_string();
                self.intern(&text)
            }
            _ => return Err(self.unexpected_token(&[Token::Identifier(Symbol::dummy())])),
        };
        self.advance();
        Ok(Identifier::new(name, span))
    }

    /// Consume a plain identifier.
    pub fn expect_identifier(&mut self) -> Result<Identifier, ParseError> {
        match self.current() {
            Token::Identifier(sym) => {
                let ident = Identifier::new(*sym, self.current_span());
                self.advance();
                Ok(ident)
            }
            _ => Err(self.unexpected_token(&[Token::Identifier(Symbol::dummy())])),
        }
    }

    /// Consume a `$variable`.
    pub fn expect_variable(&mut self) -> Result<Identifier, ParseError> {
        match self.current() {
            Token::Variable(sym) => {
                let ident = Identifier::new(*sym, self.current_span());
                self.advance();
                Ok(ident)
            }
            _ => Err(self.unexpected_token(&[Token::Variable(Symbol::dummy())])),
        }
    }

    // ========================================================================
    // Error Handling
    // ========================================================================

    /// Record a parse error and keep going.
    pub fn record(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Create an "unexpected token" error.
    pub fn unexpected_token(&self, expected: &[Token]) -> ParseError {
        let span = self.current_span();
        if self.at_eof() {
            ParseError::unexpected_eof(expected.to_vec(), span)
        } else {
            ParseError::unexpected_token(expected.to_vec(), self.current().clone(), span)
        }
    }
}

/// Parse `code` as exactly one expression, optionally followed by `;`.
///
/// Anything after the expression is rejected with
/// [`ParseErrorKind::TrailingInput`]; this is how `"1; 2;"` is told apart
/// from `"1;"`.
pub fn parse_expression_source(code: &str) -> Result<(Expression, Interner), ParseError> {
    let mut parser = Parser::new(code).map_err(|errors| {
        let first = errors.into_iter().next();
        let span = first.as_ref().map(|e| *e.span()).unwrap_or_default();
        ParseError::invalid_syntax(
            first.map(|e| e.description()).unwrap_or_default(),
            span,
        )
    })?;

    if parser.at_eof() {
        return Err(ParseError::unexpected_eof(Vec::new(), parser.current_span()));
    }

    let expression = expr::parse_expression(&mut parser)?;
    parser.eat(&Token::Semicolon);
    if !parser.at_eof() {
        return Err(ParseError::trailing_input(parser.current().clone(), parser.current_span()));
    }

    Ok((expression, parser.interner))
}
