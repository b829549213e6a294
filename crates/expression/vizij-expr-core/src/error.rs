//! Error types produced while parsing and compiling expressions.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Byte range inside the source expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Category of a grammar failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseErrorKind {
    /// A character that cannot start any token.
    InvalidCharacter,
    /// A token appeared where the grammar does not allow it.
    UnexpectedToken,
    /// The input ended before the production was complete.
    UnexpectedEof,
    /// Well-formed tokens in an unsupported arrangement.
    InvalidSyntax,
}

/// Grammar failure with the offending source location.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} at {span}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        ParseError {
            kind,
            span,
            message: message.into(),
        }
    }

    pub fn invalid_character(ch: char, at: usize) -> Self {
        Self::new(
            ParseErrorKind::InvalidCharacter,
            Span::new(at, at + ch.len_utf8()),
            format!("invalid character {ch:?}"),
        )
    }

    pub fn unexpected(found: &str, context: &str, span: Span) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedToken,
            span,
            format!("unexpected {found} {context}"),
        )
    }

    pub fn eof(context: &str, at: usize) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedEof,
            Span::new(at, at),
            format!("unexpected end of input {context}"),
        )
    }
}

/// Everything that can make a `compile` call fail.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Syntax(#[from] ParseError),

    /// Emit mode only; validate mode records the name instead.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("invalid operator: {0}")]
    InvalidOperator(String),

    #[error("sequence must have 2, 3 or 4 components, got {0}")]
    SequenceLength(usize),

    #[error("{function} expects {expected} argument(s), got {found}")]
    Arity {
        function: String,
        expected: String,
        found: usize,
    },

    #[error("token stream exhausted while evaluating {0}")]
    StackUnderflow(String),

    #[error("expression nesting exceeds the configured limit of {limit}")]
    TooDeep { limit: usize },

    #[error("invalid compiler configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid binding value: {0}")]
    InvalidBinding(String),

    /// Raised by a backend primitive and passed through untouched.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type Result<T, E = CompileError> = std::result::Result<T, E>;
