//! Domain error types for the trend analyzer.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

/// Reason a single input record could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedRecordKind {
    /// Neither `fullName` nor `name` is present
    #[error("missing test name")]
    MissingName,

    /// Neither `start` nor `stop` is present
    #[error("missing start and stop timestamps")]
    MissingTiming,

    /// Record is not valid JSON for the expected shape
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// Record parsed but its values are inconsistent
    #[error("invalid entry: {0}")]
    InvalidEntry(String),
}

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// One record is unparsable. Skipped at the ingestion boundary.
    #[error("Malformed record: {0}")]
    MalformedRecord(MalformedRecordKind),

    /// Configured input directory or file does not exist
    #[error("Input not found: {0}")]
    MissingInput(String),

    /// Filesystem operation failed
    #[error("Filesystem error: {0}")]
    FileSystem(String),

    /// Report could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

// Conversion implementations for common error types

impl From<MalformedRecordKind> for AppError {
    fn from(kind: MalformedRecordKind) -> Self {
        AppError::MalformedRecord(kind)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedRecord(MalformedRecordKind::InvalidJson(err.to_string()))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::FileSystem(err.to_string())
    }
}
