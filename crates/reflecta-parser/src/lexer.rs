//! Lexer for declaration source files.
//!
//! Regular tokens are produced by logos. Whitespace, comments and open/close
//! tags are skipped by a manual loop in front of it so that documentation
//! comments (`/** ... */`) can be kept as tokens while everything else that
//! is not code disappears, and so that line/column tracking stays exact.

use crate::interner::Interner;
use crate::token::{Span, Token};
use logos::Logos;

/// Integer literals that overflow `i64` become floats.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
    Int(i64),
    Float(f64),
}

/// Logos-based token enum for lexing.
///
/// Converted to the public `Token` enum after lexing.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(subpattern name = r"[a-zA-Z_\x{80}-\x{10FFFF}][a-zA-Z0-9_\x{80}-\x{10FFFF}]*")]
enum LogosToken {
    // Keywords (case-insensitive, must come before identifiers)
    #[token("abstract", ignore(ascii_case))]
    Abstract,
    #[token("and", ignore(ascii_case))]
    And,
    #[token("as", ignore(ascii_case))]
    As,
    #[token("case", ignore(ascii_case))]
    Case,
    #[token("class", ignore(ascii_case))]
    Class,
    #[token("clone", ignore(ascii_case))]
    Clone,
    #[token("const", ignore(ascii_case))]
    Const,
    #[token("declare", ignore(ascii_case))]
    Declare,
    #[token("extends", ignore(ascii_case))]
    Extends,
    #[token("final", ignore(ascii_case))]
    Final,
    #[token("fn", ignore(ascii_case))]
    Fn,
    #[token("function", ignore(ascii_case))]
    Function,
    #[token("implements", ignore(ascii_case))]
    Implements,
    #[token("instanceof", ignore(ascii_case))]
    Instanceof,
    #[token("insteadof", ignore(ascii_case))]
    Insteadof,
    #[token("interface", ignore(ascii_case))]
    Interface,
    #[token("namespace", ignore(ascii_case))]
    Namespace,
    #[token("new", ignore(ascii_case))]
    New,
    #[token("or", ignore(ascii_case))]
    Or,
    #[token("private", ignore(ascii_case))]
    Private,
    #[token("protected", ignore(ascii_case))]
    Protected,
    #[token("public", ignore(ascii_case))]
    Public,
    #[token("readonly", ignore(ascii_case))]
    Readonly,
    #[token("static", ignore(ascii_case))]
    Static,
    #[token("trait", ignore(ascii_case))]
    Trait,
    #[token("use", ignore(ascii_case))]
    Use,
    #[token("var", ignore(ascii_case))]
    Var,
    #[token("xor", ignore(ascii_case))]
    Xor,
    #[token("true", ignore(ascii_case))]
    True,
    #[token("false", ignore(ascii_case))]
    False,
    #[token("null", ignore(ascii_case))]
    Null,

    // Names
    #[regex(r"(?&name)", |lex| lex.slice().to_string())]
    Identifier(String),

    #[regex(r"\\?(?&name)(\\(?&name))+", |lex| lex.slice().to_string())]
    #[regex(r"\\(?&name)", |lex| lex.slice().to_string())]
    QualifiedName(String),

    #[regex(r"\$(?&name)", |lex| lex.slice()[1..].to_string())]
    Variable(String),

    // Numbers with numeric separator support
    #[regex(r"0[xX][0-9a-fA-F]+(_[0-9a-fA-F]+)*", |lex| parse_int(lex.slice(), 16))]
    #[regex(r"0[bB][01]+(_[01]+)*", |lex| parse_int(lex.slice(), 2))]
    #[regex(r"0[oO][0-7]+(_[0-7]+)*", |lex| parse_int(lex.slice(), 8))]
    #[regex(r"[0-9]+(_[0-9]+)*", |lex| parse_int(lex.slice(), 10))]
    #[regex(r"[0-9]+(_[0-9]+)*\.[0-9]+(_[0-9]+)*([eE][+-]?[0-9]+)?", parse_float)]
    #[regex(r"[0-9]+(_[0-9]+)*[eE][+-]?[0-9]+", parse_float)]
    #[regex(r"\.[0-9]+(_[0-9]+)*([eE][+-]?[0-9]+)?", parse_float)]
    Number(Number),

    // Strings
    #[regex(r"'([^'\\]|\\(.|\n))*'", |lex| unescape_single(strip_quotes(lex.slice())))]
    #[regex(r#""([^"\\]|\\(.|\n))*""#, |lex| unescape_double(strip_quotes(lex.slice())))]
    #[regex(r"`[^`]*`", |lex| strip_quotes(lex.slice()).to_string())]
    #[token("<<<", lex_heredoc)]
    StringLiteral(String),

    // Operators (longer forms first for readability; logos picks the longest match)
    #[token("<=>")]
    Spaceship,
    #[token("===")]
    EqualEqualEqual,
    #[token("!==")]
    BangEqualEqual,
    #[token("**=")]
    StarStarEqual,
    #[token("??=")]
    QuestionQuestionEqual,
    #[token("<<=")]
    LessLessEqual,
    #[token(">>=")]
    GreaterGreaterEqual,
    #[token("?->")]
    NullsafeArrow,
    #[token("...")]
    DotDotDot,
    #[token("**")]
    StarStar,
    #[token("==")]
    EqualEqual,
    #[token("!=")]
    BangEqual,
    #[token("<>")]
    LessGreater,
    #[token("<=")]
    LessEqual,
    #[token(">=")]
    GreaterEqual,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("??")]
    QuestionQuestion,
    #[token("<<")]
    LessLess,
    #[token(">>")]
    GreaterGreater,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("+=")]
    PlusEqual,
    #[token("-=")]
    MinusEqual,
    #[token("*=")]
    StarEqual,
    #[token("/=")]
    SlashEqual,
    #[token("%=")]
    PercentEqual,
    #[token(".=")]
    DotEqual,
    #[token("&=")]
    AmpEqual,
    #[token("|=")]
    PipeEqual,
    #[token("^=")]
    CaretEqual,
    #[token("->")]
    Arrow,
    #[token("=>")]
    DoubleArrow,
    #[token("::")]
    DoubleColon,
    #[token("#[")]
    HashBracket,

    // Single-character tokens
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token(".")]
    Dot,
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("=")]
    Equal,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token("@")]
    At,
    #[token("$")]
    Dollar,
    #[token("\\")]
    Backslash,
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
}

// Helper parsing functions

fn parse_int(text: &str, radix: u32) -> Option<Number> {
    let digits = text.replace('_', "");
    let body = match radix {
        10 if digits.len() > 1 && digits.starts_with('0') => {
            // Legacy octal: 0777
            return parse_digits(&digits[1..], 8);
        }
        10 => digits.as_str(),
        _ => &digits[2..],
    };
    parse_digits(body, radix)
}

fn parse_digits(body: &str, radix: u32) -> Option<Number> {
    match i64::from_str_radix(body, radix) {
        Ok(n) => Some(Number::Int(n)),
        Err(err) if matches!(err.kind(), std::num::IntErrorKind::PosOverflow) => {
            let value = body.chars().try_fold(0f64, |acc, c| {
                c.to_digit(radix).map(|d| acc * radix as f64 + d as f64)
            })?;
            Some(Number::Float(value))
        }
        Err(_) => None,
    }
}

fn parse_float(lex: &mut logos::Lexer<LogosToken>) -> Option<Number> {
    lex.slice().replace('_', "").parse().ok().map(Number::Float)
}

fn strip_quotes(s: &str) -> &str {
    &s[1..s.len() - 1]
}

/// `<<<LABEL`, `<<<"LABEL"` (heredoc) or `<<<'LABEL'` (nowdoc).
fn lex_heredoc(lex: &mut logos::Lexer<LogosToken>) -> Option<String> {
    let rest = lex.remainder();
    let header_end = rest.find('\n')?;
    let header = rest[..header_end].trim();
    let (label, nowdoc) = if header.len() >= 2 && header.starts_with('\'') && header.ends_with('\'') {
        (&header[1..header.len() - 1], true)
    } else {
        (header.trim_matches('"'), false)
    };
    if label.is_empty() || !label.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }

    let mut lines = Vec::new();
    let mut offset = header_end + 1;
    loop {
        let line_end = rest[offset..].find('\n').map_or(rest.len(), |i| offset + i);
        let line = rest[offset..line_end].trim_end_matches('\r');
        let trimmed = line.trim_start_matches([' ', '\t']);
        let closes = trimmed.starts_with(label)
            && !trimmed[label.len()..].starts_with(|c: char| c.is_alphanumeric() || c == '_');
        if closes {
            let indent = line.len() - trimmed.len();
            lex.bump(offset + indent + label.len());
            let body = lines
                .iter()
                .map(|l: &&str| l.get(indent..).unwrap_or_else(|| l.trim_start()))
                .collect::<Vec<_>>()
                .join("\n");
            return Some(if nowdoc { body } else { unescape_double(&body) });
        }
        if line_end >= rest.len() {
            return None;
        }
        lines.push(line);
        offset = line_end + 1;
    }
}

/// Single quotes only know `\\` and `\'`.
fn unescape_single(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('\\') | Some('\'') => {
                    if let Some(next) = chars.next() {
                        result.push(next);
                    }
                }
                _ => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }
    result
}

/// Double-quoted escapes; octal and hex escapes produce raw bytes.
fn unescape_double(s: &str) -> String {
    let mut out: Vec<u8> = Vec::with_capacity(s.len());
    let bytes = s.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'\\' || i + 1 >= bytes.len() {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        let next = bytes[i + 1];
        let simple = match next {
            b'n' => Some(b'\n'),
            b't' => Some(b'\t'),
            b'r' => Some(b'\r'),
            b'v' => Some(0x0b),
            b'e' => Some(0x1b),
            b'f' => Some(0x0c),
            b'\\' => Some(b'\\'),
            b'$' => Some(b'$'),
            b'"' => Some(b'"'),
            _ => None,
        };
        if let Some(b) = simple {
            out.push(b);
            i += 2;
            continue;
        }
        match next {
            b'0'..=b'7' => {
                let end = (i + 1..(i + 4).min(bytes.len()))
                    .take_while(|&j| (b'0'..=b'7').contains(&bytes[j]))
                    .last()
                    .map_or(i + 2, |j| j + 1);
                let value = u32::from_str_radix(&s[i + 1..end], 8).unwrap_or(0);
                out.push((value & 0xff) as u8);
                i = end;
            }
            b'x' if i + 2 < bytes.len() && bytes[i + 2].is_ascii_hexdigit() => {
                let end = if i + 3 < bytes.len() && bytes[i + 3].is_ascii_hexdigit() {
                    i + 4
                } else {
                    i + 3
                };
                let value = u8::from_str_radix(&s[i + 2..end], 16).unwrap_or(0);
                out.push(value);
                i = end;
            }
            b'u' if bytes.get(i + 2) == Some(&b'{') => match s[i + 3..].find('}') {
                Some(close) => {
                    let hex = &s[i + 3..i + 3 + close];
                    match u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
                        Some(ch) => {
                            let mut buf = [0u8; 4];
                            out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                            i += 4 + close;
                        }
                        None => {
                            out.push(b'\\');
                            i += 1;
                        }
                    }
                }
                None => {
                    out.push(b'\\');
                    i += 1;
                }
            },
            _ => {
                out.push(b'\\');
                i += 1;
            }
        }
    }

    // Byte escapes that do not form UTF-8 become U+FFFD
    String::from_utf8_lossy(&out).into_owned()
}

/// Main lexer structure.
pub struct Lexer<'a> {
    source: &'a str,
    tokens: Vec<(Token, Span)>,
    errors: Vec<LexError>,
    interner: Interner,
}

/// Lexer error types.
#[derive(Debug, Clone, PartialEq)]
pub enum LexError {
    UnexpectedCharacter { char: char, span: Span },
    UnterminatedString { span: Span },
    UnterminatedComment { span: Span },
    UnterminatedHeredoc { span: Span },
    InvalidNumber { text: String, span: Span },
}

/// Tracks line and column while the manual skip loop and logos advance.
struct Cursor {
    pos: usize,
    line: u32,
    column: u32,
}

impl Cursor {
    fn advance_over(&mut self, text: &str) {
        for c in text.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.pos += text.len();
    }
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            errors: Vec::new(),
            interner: Interner::with_capacity(256),
        }
    }

    /// Format all errors with source context
    pub fn format_errors(errors: &[LexError], source: &str) -> String {
        errors
            .iter()
            .map(|e| e.format_with_source(source))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn tokenize(mut self) -> Result<(Vec<(Token, Span)>, Interner), Vec<LexError>> {
        let mut cursor = Cursor {
            pos: 0,
            line: 1,
            column: 1,
        };

        while cursor.pos < self.source.len() {
            self.skip_trivia(&mut cursor);

            if cursor.pos >= self.source.len() {
                break;
            }

            // Use logos for regular tokens
            let mut logos_lexer = LogosToken::lexer(&self.source[cursor.pos..]);

            let Some(token_result) = logos_lexer.next() else {
                break;
            };
            let range = logos_lexer.span();
            let abs_start = cursor.pos + range.start;
            let mut abs_end =
                cursor.pos + range.end.max(range.start + 1).min(self.source.len() - cursor.pos);
            while !self.source.is_char_boundary(abs_end) {
                abs_end += 1;
            }
            let span = Span::new(abs_start, abs_end, cursor.line, cursor.column);

            match token_result {
                Ok(logos_token) => {
                    let token = self.convert_token(logos_token);
                    self.tokens.push((token, span));
                }
                Err(()) => {
                    let rest = &self.source[abs_start..];
                    self.errors.push(classify_error(rest, span));
                }
            }

            let consumed = &self.source[cursor.pos..abs_end];
            cursor.advance_over(consumed);
        }

        // Add EOF token
        let eof_span = Span::new(self.source.len(), self.source.len(), cursor.line, cursor.column);
        self.tokens.push((Token::Eof, eof_span));

        if self.errors.is_empty() {
            Ok((self.tokens, self.interner))
        } else {
            Err(self.errors)
        }
    }

    /// Skip whitespace, comments and open/close tags; documentation
    /// comments are pushed as tokens.
    fn skip_trivia(&mut self, cursor: &mut Cursor) {
        let source = self.source;
        let bytes = source.as_bytes();

        while cursor.pos < bytes.len() {
            let rest = &source[cursor.pos..];
            match bytes[cursor.pos] {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    let len = rest
                        .find(|c: char| !matches!(c, ' ' | '\t' | '\r' | '\n'))
                        .unwrap_or(rest.len());
                    cursor.advance_over(&rest[..len]);
                }
                b'<' if rest.starts_with("<?php") => cursor.advance_over("<?php"),
                b'<' if rest.starts_with("<?=") => cursor.advance_over("<?="),
                b'?' if rest.starts_with("?>") => {
                    // Inline text up to the next open tag is not code
                    let len = rest.find("<?php").unwrap_or(rest.len());
                    cursor.advance_over(&rest[..len]);
                }
                b'#' if !rest.starts_with("#[") => {
                    let len = rest.find('\n').unwrap_or(rest.len());
                    cursor.advance_over(&rest[..len]);
                }
                b'/' if rest.starts_with("//") => {
                    let len = rest.find('\n').unwrap_or(rest.len());
                    cursor.advance_over(&rest[..len]);
                }
                b'/' if rest.starts_with("/*") => {
                    let start = Span::new(cursor.pos, cursor.pos + 2, cursor.line, cursor.column);
                    let Some(close) = rest[2..].find("*/") else {
                        self.errors.push(LexError::UnterminatedComment { span: start });
                        cursor.advance_over(rest);
                        return;
                    };
                    let text = &rest[..close + 4];
                    if text.starts_with("/**") && text.len() > 4 {
                        let span = Span::new(cursor.pos, cursor.pos + text.len(), cursor.line, cursor.column);
                        let sym = self.interner.intern(text);
                        self.tokens.push((Token::DocComment(sym), span));
                    }
                    cursor.advance_over(text);
                }
                _ => return,
            }
        }
    }

    fn convert_token(&mut self, logos_token: LogosToken) -> Token {
        match logos_token {
            LogosToken::Abstract => Token::Abstract,
            LogosToken::And => Token::And,
            LogosToken::As => Token::As,
            LogosToken::Case => Token::Case,
            LogosToken::Class => Token::Class,
            LogosToken::Clone => Token::Clone,
            LogosToken::Const => Token::Const,
            LogosToken::Declare => Token::Declare,
            LogosToken::Extends => Token::Extends,
            LogosToken::Final => Token::Final,
            LogosToken::Fn => Token::Fn,
            LogosToken::Function => Token::Function,
            LogosToken::Implements => Token::Implements,
            LogosToken::Instanceof => Token::Instanceof,
            LogosToken::Insteadof => Token::Insteadof,
            LogosToken::Interface => Token::Interface,
            LogosToken::Namespace => Token::Namespace,
            LogosToken::New => Token::New,
            LogosToken::Or => Token::Or,
            LogosToken::Private => Token::Private,
            LogosToken::Protected => Token::Protected,
            LogosToken::Public => Token::Public,
            LogosToken::Readonly => Token::Readonly,
            LogosToken::Static => Token::Static,
            LogosToken::Trait => Token::Trait,
            LogosToken::Use => Token::Use,
            LogosToken::Var => Token::Var,
            LogosToken::Xor => Token::Xor,
            LogosToken::True => Token::True,
            LogosToken::False => Token::False,
            LogosToken::Null => Token::Null,
            LogosToken::Identifier(s) => Token::Identifier(self.interner.intern(&s)),
            LogosToken::QualifiedName(s) => Token::QualifiedName(self.interner.intern(&s)),
            LogosToken::Variable(s) => Token::Variable(self.interner.intern(&s)),
            LogosToken::Number(Number::Int(n)) => Token::IntLiteral(n),
            LogosToken::Number(Number::Float(n)) => Token::FloatLiteral(n),
            LogosToken::StringLiteral(s) => Token::StringLiteral(self.interner.intern(&s)),
            LogosToken::Spaceship => Token::Spaceship,
            LogosToken::EqualEqualEqual => Token::EqualEqualEqual,
            LogosToken::BangEqualEqual => Token::BangEqualEqual,
            LogosToken::StarStarEqual => Token::StarStarEqual,
            LogosToken::QuestionQuestionEqual => Token::QuestionQuestionEqual,
            LogosToken::LessLessEqual => Token::LessLessEqual,
            LogosToken::GreaterGreaterEqual => Token::GreaterGreaterEqual,
            LogosToken::NullsafeArrow => Token::NullsafeArrow,
            LogosToken::DotDotDot => Token::DotDotDot,
            LogosToken::StarStar => Token::StarStar,
            LogosToken::EqualEqual => Token::EqualEqual,
            LogosToken::BangEqual => Token::BangEqual,
            LogosToken::LessGreater => Token::LessGreater,
            LogosToken::LessEqual => Token::LessEqual,
            LogosToken::GreaterEqual => Token::GreaterEqual,
            LogosToken::AmpAmp => Token::AmpAmp,
            LogosToken::PipePipe => Token::PipePipe,
            LogosToken::QuestionQuestion => Token::QuestionQuestion,
            LogosToken::LessLess => Token::LessLess,
            LogosToken::GreaterGreater => Token::GreaterGreater,
            LogosToken::PlusPlus => Token::PlusPlus,
            LogosToken::MinusMinus => Token::MinusMinus,
            LogosToken::PlusEqual => Token::PlusEqual,
            LogosToken::MinusEqual => Token::MinusEqual,
            LogosToken::StarEqual => Token::StarEqual,
            LogosToken::SlashEqual => Token::SlashEqual,
            LogosToken::PercentEqual => Token::PercentEqual,
            LogosToken::DotEqual => Token::DotEqual,
            LogosToken::AmpEqual => Token::AmpEqual,
            LogosToken::PipeEqual => Token::PipeEqual,
            LogosToken::CaretEqual => Token::CaretEqual,
            LogosToken::Arrow => Token::Arrow,
            LogosToken::DoubleArrow => Token::DoubleArrow,
            LogosToken::DoubleColon => Token::DoubleColon,
            LogosToken::HashBracket => Token::HashBracket,
            LogosToken::Plus => Token::Plus,
            LogosToken::Minus => Token::Minus,
            LogosToken::Star => Token::Star,
            LogosToken::Slash => Token::Slash,
            LogosToken::Percent => Token::Percent,
            LogosToken::Dot => Token::Dot,
            LogosToken::Bang => Token::Bang,
            LogosToken::Tilde => Token::Tilde,
            LogosToken::Amp => Token::Amp,
            LogosToken::Pipe => Token::Pipe,
            LogosToken::Caret => Token::Caret,
            LogosToken::Less => Token::Less,
            LogosToken::Greater => Token::Greater,
            LogosToken::Equal => Token::Equal,
            LogosToken::Question => Token::Question,
            LogosToken::Colon => Token::Colon,
            LogosToken::Semicolon => Token::Semicolon,
            LogosToken::Comma => Token::Comma,
            LogosToken::At => Token::At,
            LogosToken::Dollar => Token::Dollar,
            LogosToken::Backslash => Token::Backslash,
            LogosToken::LeftParen => Token::LeftParen,
            LogosToken::RightParen => Token::RightParen,
            LogosToken::LeftBrace => Token::LeftBrace,
            LogosToken::RightBrace => Token::RightBrace,
            LogosToken::LeftBracket => Token::LeftBracket,
            LogosToken::RightBracket => Token::RightBracket,
        }
    }
}

fn classify_error(rest: &str, span: Span) -> LexError {
    match rest.chars().next() {
        Some('\'') | Some('"') | Some('`') => LexError::UnterminatedString { span },
        Some('<') if rest.starts_with("<<<") => LexError::UnterminatedHeredoc { span },
        Some(c) if c.is_ascii_digit() => LexError::InvalidNumber {
            text: rest[..span.len().min(rest.len())].to_string(),
            span,
        },
        Some(c) => LexError::UnexpectedCharacter { char: c, span },
        None => LexError::UnexpectedCharacter { char: '\0', span },
    }
}

impl LexError {
    /// Get the span of this error
    pub fn span(&self) -> &Span {
        match self {
            LexError::UnexpectedCharacter { span, .. }
            | LexError::UnterminatedString { span }
            | LexError::UnterminatedComment { span }
            | LexError::UnterminatedHeredoc { span }
            | LexError::InvalidNumber { span, .. } => span,
        }
    }

    /// Get a description of this error
    pub fn description(&self) -> String {
        match self {
            LexError::UnexpectedCharacter { char, .. } => {
                format!("Unexpected character '{}'", char)
            }
            LexError::UnterminatedString { .. } => "Unterminated string literal".to_string(),
            LexError::UnterminatedComment { .. } => "Unterminated comment".to_string(),
            LexError::UnterminatedHeredoc { .. } => "Unterminated heredoc".to_string(),
            LexError::InvalidNumber { text, .. } => format!("Invalid numeric literal '{}'", text),
        }
    }

    /// Get a hint for fixing this error
    pub fn hint(&self) -> Option<String> {
        match self {
            LexError::UnterminatedString { .. } => {
                Some("Add a closing quote to terminate the string".to_string())
            }
            LexError::UnterminatedComment { .. } => Some("Close the comment with */".to_string()),
            LexError::UnterminatedHeredoc { .. } => {
                Some("End the heredoc with its label on a line of its own".to_string())
            }
            _ => None,
        }
    }

    /// Format the error with source context
    pub fn format_with_source(&self, source: &str) -> String {
        let span = self.span();
        let mut result = format!(
            "Error at {}:{}: {}\n",
            span.line,
            span.column,
            self.description()
        );

        if let Some(error_line) = source.lines().nth(span.line.saturating_sub(1) as usize) {
            result.push_str("  |\n");
            result.push_str(&format!("{:3} | {}\n", span.line, error_line));
            result.push_str(&format!(
                "  | {}^\n",
                " ".repeat(span.column.saturating_sub(1) as usize)
            ));
        }

        if let Some(hint) = self.hint() {
            result.push_str(&format!("\nHint: {}\n", hint));
        }

        result
    }
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.description(),
            self.span().line,
            self.span().column
        )
    }
}

impl std::error::Error for LexError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> (Vec<Token>, Interner) {
        let (tokens, interner) = Lexer::new(source).tokenize().expect("should lex");
        (tokens.into_iter().map(|(t, _)| t).collect(), interner)
    }

    #[test]
    fn test_open_tag_and_comments_skipped() {
        let (tokens, _) = lex("<?php // line\n# hash\n/* block */ class");
        assert_eq!(tokens, vec![Token::Class, Token::Eof]);
    }

    #[test]
    fn test_doc_comment_is_kept() {
        let (tokens, interner) = lex("/** @var int */ public");
        match &tokens[0] {
            Token::DocComment(sym) => assert_eq!(interner.resolve(*sym), "/** @var int */"),
            other => panic!("Expected DocComment, got {:?}", other),
        }
        assert_eq!(tokens[1], Token::Public);
    }

    #[test]
    fn test_empty_block_comment_is_not_doc() {
        let (tokens, _) = lex("/**/ const");
        assert_eq!(tokens, vec![Token::Const, Token::Eof]);
    }

    #[test]
    fn test_attribute_start_vs_hash_comment() {
        let (tokens, _) = lex("#[Test]\n# not code");
        assert_eq!(tokens[0], Token::HashBracket);
        assert!(matches!(tokens[1], Token::Identifier(_)));
        assert_eq!(tokens[2], Token::RightBracket);
        assert_eq!(tokens[3], Token::Eof);
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let (tokens, _) = lex("CLASS True NULL New");
        assert_eq!(
            tokens,
            vec![Token::Class, Token::True, Token::Null, Token::New, Token::Eof]
        );
    }

    #[test]
    fn test_names() {
        let (tokens, interner) = lex(r"\lang\Value util\Date namespace\Local $var self");
        let texts: Vec<String> = tokens
            .iter()
            .filter_map(|t| match t {
                Token::QualifiedName(s) => Some(format!("Q:{}", interner.resolve(*s))),
                Token::Variable(s) => Some(format!("V:{}", interner.resolve(*s))),
                Token::Identifier(s) => Some(format!("I:{}", interner.resolve(*s))),
                _ => None,
            })
            .collect();
        assert_eq!(
            texts,
            vec![
                r"Q:\lang\Value",
                r"Q:util\Date",
                r"Q:namespace\Local",
                "V:var",
                "I:self"
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let (tokens, _) = lex("42 0x1F 0b101 0o17 017 1_000 1.5 .5 1e3");
        assert_eq!(
            tokens,
            vec![
                Token::IntLiteral(42),
                Token::IntLiteral(31),
                Token::IntLiteral(5),
                Token::IntLiteral(15),
                Token::IntLiteral(15),
                Token::IntLiteral(1000),
                Token::FloatLiteral(1.5),
                Token::FloatLiteral(0.5),
                Token::FloatLiteral(1000.0),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_integer_overflow_becomes_float() {
        let (tokens, _) = lex("9223372036854775808");
        assert_eq!(tokens[0], Token::FloatLiteral(9223372036854775808.0));
    }

    #[test]
    fn test_string_escapes() {
        let (tokens, interner) = lex(r#"'a\'b\n' "a\tb\x41\101\u{263A}\q""#);
        let strings: Vec<&str> = tokens
            .iter()
            .filter_map(|t| match t {
                Token::StringLiteral(s) => Some(interner.resolve(*s)),
                _ => None,
            })
            .collect();
        assert_eq!(strings, vec!["a'b\\n", "a\tbAA\u{263A}\\q"]);
    }

    #[test]
    fn test_invalid_utf8_escapes_are_replaced() {
        let (tokens, interner) = lex(r#""\xFF\xC3\xA9""#);
        let strings: Vec<&str> = tokens
            .iter()
            .filter_map(|t| match t {
                Token::StringLiteral(s) => Some(interner.resolve(*s)),
                _ => None,
            })
            .collect();
        assert_eq!(strings, vec!["\u{FFFD}\u{e9}"]);
    }

    #[test]
    fn test_heredoc_and_nowdoc() {
        let source = "<<<EOT\n  Hello\\tWorld\n  EOT;\n<<<'RAW'\nkeep\\t\nRAW;";
        let (tokens, interner) = lex(source);
        let strings: Vec<&str> = tokens
            .iter()
            .filter_map(|t| match t {
                Token::StringLiteral(s) => Some(interner.resolve(*s)),
                _ => None,
            })
            .collect();
        assert_eq!(strings, vec!["Hello\tWorld", "keep\\t"]);
        assert_eq!(tokens[1], Token::Semicolon);
    }

    #[test]
    fn test_operators() {
        let (tokens, _) = lex("<=> ** ?? ?-> :: => -> ... <> !==");
        assert_eq!(
            tokens,
            vec![
                Token::Spaceship,
                Token::StarStar,
                Token::QuestionQuestion,
                Token::NullsafeArrow,
                Token::DoubleColon,
                Token::DoubleArrow,
                Token::Arrow,
                Token::DotDotDot,
                Token::LessGreater,
                Token::BangEqualEqual,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_close_tag_skips_inline_text() {
        let (tokens, _) = lex("<?php const ?>\n<html>\n<?php ;");
        assert_eq!(tokens, vec![Token::Const, Token::Semicolon, Token::Eof]);
    }

    #[test]
    fn test_line_and_column_tracking() {
        let (tokens, _) = Lexer::new("<?php\n\n  class Foo").tokenize().unwrap();
        let (_, span) = &tokens[1];
        assert_eq!(span.line, 3);
        assert_eq!(span.column, 9);
    }

    #[test]
    fn test_unterminated_string() {
        let errors = Lexer::new("'abc").tokenize().unwrap_err();
        assert!(matches!(errors[0], LexError::UnterminatedString { .. }));
    }

    #[test]
    fn test_unterminated_comment() {
        let errors = Lexer::new("/* never closed").tokenize().unwrap_err();
        assert!(matches!(errors[0], LexError::UnterminatedComment { .. }));
    }
}
