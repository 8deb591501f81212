//! Metadata resolution errors

use reflecta_parser::{LexError, ParseError};
use thiserror::Error;

pub type MetaResult<T> = Result<T, MetaError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetaError {
    /// The locator could not find or read the file declaring a type
    #[error("Source for {name} unavailable: {reason}")]
    SourceUnavailable { name: String, reason: String },

    /// The declaring file does not parse
    #[error("Parse error in {origin} at {line}:{column}: {message}")]
    ParseFailure {
        origin: String,
        line: u32,
        column: u32,
        message: String,
    },

    /// Code handed to `evaluate` or a computed argument is not exactly one expression
    #[error("Invalid expression `{code}`: {reason}")]
    InvalidExpression { code: String, reason: String },

    /// A name that does not resolve: `parent` without a parent, an unknown
    /// constant, an unknown member
    #[error("Cannot resolve {name}: {reason}")]
    UnresolvedReference { name: String, reason: String },

    #[error("Evaluation error: {message}")]
    EvaluationError { message: String },

    #[error("Invalid options: {0}")]
    Options(String),
}

impl MetaError {
    pub(crate) fn unavailable(name: &str, reason: impl Into<String>) -> Self {
        MetaError::SourceUnavailable {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unresolved(name: impl Into<String>, reason: impl Into<String>) -> Self {
        MetaError::UnresolvedReference {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn evaluation(message: impl Into<String>) -> Self {
        MetaError::EvaluationError {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_expression(code: &str, reason: impl Into<String>) -> Self {
        MetaError::InvalidExpression {
            code: code.to_string(),
            reason: reason.into(),
        }
    }

    /// First parser error of a file, with its origin.
    pub(crate) fn from_parse_errors(origin: &str, errors: &[ParseError]) -> Self {
        match errors.first() {
            Some(err) => MetaError::ParseFailure {
                origin: origin.to_string(),
                line: err.span.line,
                column: err.span.column,
                message: err.message.clone(),
            },
            None => MetaError::ParseFailure {
                origin: origin.to_string(),
                line: 0,
                column: 0,
                message: "unknown parse error".to_string(),
            },
        }
    }

    pub(crate) fn from_lex_errors(origin: &str, errors: &[LexError]) -> Self {
        match errors.first() {
            Some(err) => MetaError::ParseFailure {
                origin: origin.to_string(),
                line: err.span().line,
                column: err.span().column,
                message: err.description(),
            },
            None => MetaError::ParseFailure {
                origin: origin.to_string(),
                line: 0,
                column: 0,
                message: "unknown lexical error".to_string(),
            },
        }
    }
}
