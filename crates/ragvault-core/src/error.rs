use thiserror::Error;

/// A convenience `Result` alias using [`RagError`].
pub type RagResult<T> = Result<T, RagError>;

/// Top-level error type for ragvault.
///
/// Each variant corresponds to a subsystem that can fail. Messages carry
/// diagnostic detail and are meant for logs, never for API responses.
#[derive(Error, Debug)]
pub enum RagError {
    /// The embedding model could not produce a vector.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// An embedding had a different length than the store expects.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension the store was built for.
        expected: usize,
        /// Dimension of the offending vector.
        actual: usize,
    },

    /// A persisted snapshot could not be parsed or validated.
    #[error("Snapshot corrupt at line {line}: {reason}")]
    StoreCorruption {
        /// 1-based line number of the offending row.
        line: usize,
        /// What was wrong with the row.
        reason: String,
    },

    /// The completion backend failed.
    #[error("Completion error: {0}")]
    Completion(String),

    /// A security-related error (tokens, TLS, credentials).
    #[error("Security error: {0}")]
    Security(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// An error from an outbound HTTP request.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RagError {
    /// Shorthand for a [`RagError::StoreCorruption`] at `line`.
    pub fn corrupt(line: usize, reason: impl Into<String>) -> Self {
        Self::StoreCorruption {
            line,
            reason: reason.into(),
        }
    }
}
