//! Parse-stage error types.
//!
//! All variants carry the offending 1-based source line where one exists.
//! These are deterministic failures on static input; a document that fails
//! to parse is abandoned before any rendering starts.

use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    /// Structural failure: missing or misordered delimiters, or a front
    /// matter block that is not a table of key/value fields.
    #[error("line {line}: malformed document: {reason}")]
    MalformedDocument { line: usize, reason: String },

    /// A required front-matter field is absent or empty.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A recognized front-matter field has a value of the wrong shape.
    #[error("line {line}: invalid value for `{field}`: {reason}")]
    InvalidField {
        field: String,
        line: usize,
        reason: String,
    },

    /// An opened fence or shortcode block never closes.
    #[error("line {line}: unterminated {kind} opened here")]
    UnterminatedBlock { kind: BlockKind, line: usize },
}

impl ParseError {
    /// The source line the error points at, where the variant has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::MalformedDocument { line, .. }
            | ParseError::InvalidField { line, .. }
            | ParseError::UnterminatedBlock { line, .. } => Some(*line),
            ParseError::MissingField(_) => None,
        }
    }
}

/// Which delimiter family an unterminated block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Fence,
    Shortcode,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::Fence => write!(f, "code fence"),
            BlockKind::Shortcode => write!(f, "shortcode block"),
        }
    }
}
