//! Export error types.

use thiserror::Error;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors that can occur while producing or delivering an exported file.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Failed to write {name}: {source}")]
    Write {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid file name: {0}")]
    InvalidName(String),
}

impl ExportError {
    pub fn csv(msg: impl Into<String>) -> Self {
        Self::Csv(msg.into())
    }

    /// True when the exported data itself was malformed, as opposed to the
    /// sink failing to store it.
    pub fn is_decode(&self) -> bool {
        matches!(self, ExportError::InvalidBase64(_))
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}
