//! Error types for gfakit

use thiserror::Error;

/// Result type alias for gfakit operations
pub type Result<T> = std::result::Result<T, GfaError>;

/// Main error type for gfakit
#[derive(Error, Debug)]
pub enum GfaError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed line: wrong arity, bad number, bad orientation or tag
    #[error("GFA parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A line whose leading field names no known record type
    #[error("GFA parse error at line {line}: unknown record type '{leader}'")]
    UnknownRecord { line: usize, leader: String },

    /// A record that the declared version does not define
    #[error("GFA parse error at line {line}: '{record}' lines cannot be read under version {version}")]
    VersionMismatch {
        line: usize,
        record: String,
        version: String,
    },

    /// FASTA index errors
    #[error("Index error: {0}")]
    Index(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File not found errors
    #[error("File not found: {0}")]
    FileNotFound(String),
}

impl GfaError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        GfaError::Parse {
            line,
            message: message.into(),
        }
    }
}

impl From<bincode::Error> for GfaError {
    fn from(err: bincode::Error) -> Self {
        GfaError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for GfaError {
    fn from(err: serde_json::Error) -> Self {
        GfaError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_carries_line() {
        let err = GfaError::parse(7, "Segment record requires at least 3 fields");
        assert_eq!(
            err.to_string(),
            "GFA parse error at line 7: Segment record requires at least 3 fields"
        );
    }

    #[test]
    fn test_version_mismatch_message() {
        let err = GfaError::VersionMismatch {
            line: 3,
            record: "P".to_string(),
            version: "2.0".to_string(),
        };
        assert!(err.to_string().contains("'P' lines cannot be read under version 2.0"));
    }
}
