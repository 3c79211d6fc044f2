//! Error types for YAML parsing with source locations.

use crate::SourceInfo;
use thiserror::Error;

/// Result type alias for typed-yaml-tree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building a document tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// YAML syntax error
    #[error("Parse error: {message}")]
    ParseError {
        message: String,
        location: Option<SourceInfo>,
    },

    /// The input contained no YAML document at all
    #[error("No YAML document found")]
    EmptyDocument,

    /// Invalid YAML structure
    #[error("Invalid YAML structure: {message}")]
    InvalidStructure {
        message: String,
        location: Option<SourceInfo>,
    },
}

impl From<yaml_rust2::ScanError> for Error {
    fn from(err: yaml_rust2::ScanError) -> Self {
        let marker = *err.marker();
        Error::ParseError {
            message: err.to_string(),
            location: Some(SourceInfo::from_marker(&marker, 0)),
        }
    }
}
