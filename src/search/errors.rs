//! # Search Errors
//!
//! Error types for parsing and compiling search queries.

use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// What went wrong while parsing a search string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// `(` without a matching `)`
    #[error("unbalanced parenthesis")]
    UnbalancedParenthesis,

    /// `)` with nothing open
    #[error("unexpected closing parenthesis")]
    UnexpectedClosingParenthesis,

    /// Quote opened and never closed
    #[error("unterminated quote")]
    UnterminatedQuote,

    /// A token that cannot appear here
    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),

    /// Input ended where an operand was required
    #[error("unexpected end of query")]
    UnexpectedEnd,

    /// Two operands with no AND/OR between them
    #[error("expected AND or OR before '{0}'")]
    MissingOperator(String),

    /// A bare value outside any `field:` scope
    #[error("value '{0}' is not scoped to a field")]
    UnscopedTerm(String),

    /// More than `MAX_DEPTH` open parentheses
    #[error("parentheses nested deeper than {0}")]
    NestingTooDeep(usize),
}

/// A syntax error with the byte offset where it was detected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at offset {position}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub position: usize,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, position: usize) -> Self {
        Self { kind, position }
    }
}

/// Search query errors
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    /// Malformed query text
    #[error("Invalid search syntax: {0}")]
    Parse(#[from] ParseError),

    /// A term that is not a valid match pattern
    #[error("Invalid search pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A term compiled without an enclosing field
    #[error("Search term '{0}' has no field scope")]
    UnscopedTerm(String),
}
