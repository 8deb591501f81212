//! Parse error types and error reporting

use crate::token::{Span, Token};
use std::fmt;

/// A parse error with location and contextual information.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// The kind of error that occurred
    pub kind: ParseErrorKind,

    /// Source location of the error
    pub span: Span,

    /// Human-readable error message
    pub message: String,

    /// Optional suggestion for fixing the error
    pub suggestion: Option<String>,
}

/// The kind of parse error.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    /// Unexpected token found
    UnexpectedToken { expected: Vec<Token>, found: Token },

    /// Unexpected end of file
    UnexpectedEof { expected: Vec<Token> },

    /// Invalid syntax
    InvalidSyntax { reason: String },

    /// Construct that is valid code but not a constant expression
    Unsupported { construct: String },

    /// Input continues after a complete standalone expression
    TrailingInput { found: Token },

    /// Parser exceeded iteration/depth limit
    ParserLimitExceeded { message: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parse error at {}:{}: {}",
            self.span.line, self.span.column, self.message
        )?;

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  Suggestion: {}", suggestion)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}

fn describe(expected: &[Token]) -> String {
    expected
        .iter()
        .map(|t| format!("'{}'", t))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ParseError {
    /// Create an "unexpected token" error.
    pub fn unexpected_token(expected: Vec<Token>, found: Token, span: Span) -> Self {
        let message = match expected.len() {
            0 => format!("Unexpected '{}'", found),
            1 => format!("Expected {}, found '{}'", describe(&expected), found),
            _ => format!("Expected one of {}, found '{}'", describe(&expected), found),
        };

        Self {
            kind: ParseErrorKind::UnexpectedToken { expected, found },
            span,
            message,
            suggestion: None,
        }
    }

    /// Create an "unexpected EOF" error.
    pub fn unexpected_eof(expected: Vec<Token>, span: Span) -> Self {
        let message = if expected.is_empty() {
            "Unexpected end of file".to_string()
        } else {
            format!("Unexpected end of file, expected {}", describe(&expected))
        };

        Self {
            kind: ParseErrorKind::UnexpectedEof { expected },
            span,
            message,
            suggestion: None,
        }
    }

    /// Create an "invalid syntax" error.
    pub fn invalid_syntax(reason: impl Into<String>, span: Span) -> Self {
        let reason = reason.into();
        Self {
            message: format!("Invalid syntax: {}", reason),
            kind: ParseErrorKind::InvalidSyntax { reason },
            span,
            suggestion: None,
        }
    }

    /// Create an "unsupported construct" error.
    pub fn unsupported(construct: impl Into<String>, span: Span) -> Self {
        let construct = construct.into();
        Self {
            message: format!("{} cannot be used in a constant expression", construct),
            kind: ParseErrorKind::Unsupported { construct },
            span,
            suggestion: None,
        }
    }

    /// Create a "trailing input" error.
    pub fn trailing_input(found: Token, span: Span) -> Self {
        Self {
            message: format!("Expected a single expression, found '{}' after it", found),
            kind: ParseErrorKind::TrailingInput { found },
            span,
            suggestion: None,
        }
    }

    /// Create a "parser limit exceeded" error.
    pub fn parser_limit_exceeded(message: impl Into<String>, span: Span) -> Self {
        let message = message.into();
        Self {
            kind: ParseErrorKind::ParserLimitExceeded {
                message: message.clone(),
            },
            span,
            message: format!("Parser limit exceeded: {}", message),
            suggestion: None,
        }
    }

    /// Add a suggestion to this error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_position_and_suggestion() {
        let err = ParseError::unsupported("A variable", Span::new(3, 5, 2, 7))
            .with_suggestion("Use a class constant instead");
        let text = err.to_string();
        assert!(text.starts_with("Parse error at 2:7:"));
        assert!(text.contains("A variable cannot be used in a constant expression"));
        assert!(text.contains("Suggestion: Use a class constant instead"));
    }

    #[test]
    fn test_unexpected_token_message() {
        let err = ParseError::unexpected_token(vec![Token::Semicolon], Token::Comma, Span::default());
        assert_eq!(err.message, "Expected ';', found ','");
    }
}
