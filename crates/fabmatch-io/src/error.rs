//! Error types for fabmatch-io.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for fabmatch-io operations.
pub type Result<T> = std::result::Result<T, IoError>;

/// Errors that can occur while extracting or loading records.
#[derive(Debug, Error)]
pub enum IoError {
    /// Input is not in the expected format.
    #[error("unknown format: {0}")]
    UnknownFormat(String),

    /// Parse error when reading a file.
    #[error("parse error: {message}")]
    ParseError {
        /// Error message.
        message: String,
        /// Byte offset where the error occurred.
        offset: Option<usize>,
        /// Context about what was being parsed.
        context: Option<String>,
    },

    /// Failure opening, reading or writing a specific file.
    #[error("{}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed XML.
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),
}

impl IoError {
    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
            offset: None,
            context: None,
        }
    }

    /// Create a parse error with offset.
    pub fn parse_at(message: impl Into<String>, offset: usize) -> Self {
        Self::ParseError {
            message: message.into(),
            offset: Some(offset),
            context: None,
        }
    }

    /// Create a parse error with context.
    pub fn parse_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
            offset: None,
            context: Some(context.into()),
        }
    }

    /// Attach the offending path to an I/O error.
    pub fn file(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::File {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
