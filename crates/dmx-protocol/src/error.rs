//! Error types for wire protocol parsing

use thiserror::Error;

/// Errors that can occur while parsing protocol data
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Update line did not split into exactly two integer fields
    #[error("malformed update line: {line:?}")]
    MalformedUpdate {
        /// The raw payload, kept for diagnostics
        line: String,
    },
}

impl ParseError {
    /// The raw line that failed to parse
    pub fn line(&self) -> &str {
        match self {
            ParseError::MalformedUpdate { line } => line,
        }
    }
}
