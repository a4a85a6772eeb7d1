//! Error types for the extractor.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for extraction operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Input path does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Record buffer ended before a field could be read
    #[error("Unexpected end of buffer at position {pos} (wanted {wanted} bytes)")]
    UnexpectedEof { pos: usize, wanted: usize },

    /// Invalid data structure in a record or blob
    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    /// Object does not carry the requested record kind
    #[error("Kind mismatch: expected {expected}, got {actual}")]
    KindMismatch { expected: String, actual: String },

    /// Record layout is not known for this version
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(String),

    /// A cross-reference or name could not be resolved
    #[error("Unresolved reference: {0}")]
    Unresolved(String),

    /// Container paths could not be used to group models
    #[error("Correlation failed: {0}")]
    Correlation(String),

    /// Texture could not be encoded
    #[error("Image encoding failed: {0}")]
    Image(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Create an unresolved reference error.
    pub fn unresolved(msg: impl Into<String>) -> Self {
        Self::Unresolved(msg.into())
    }

    /// True for errors caused by the record data itself rather than the environment.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedEof { .. }
                | Self::InvalidStructure(_)
                | Self::KindMismatch { .. }
                | Self::UnsupportedVersion(_)
                | Self::Utf8(_)
        )
    }
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::UnexpectedEof { pos: 12, wanted: 4 };
        assert!(e.to_string().contains("12"));
        assert!(e.to_string().contains("4"));

        let e = Error::KindMismatch { expected: "CubismMoc".into(), actual: "CubismPart".into() };
        assert!(e.to_string().contains("CubismMoc"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_decode_error());
    }

    #[test]
    fn test_decode_error_classification() {
        assert!(Error::invalid("bad").is_decode_error());
        assert!(!Error::unresolved("ParamX").is_decode_error());
    }
}
