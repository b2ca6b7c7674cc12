//! Session error types.

use thiserror::Error;

use esense_client::{ClientError, FailureKind};
use esense_export::ExportError;

pub type SessionResult<T> = Result<T, SessionError>;

/// Broad class of a [`SessionError`], for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Transport,
    Decode,
    InFlight,
    NoData,
    Export,
}

/// Failure held in a controller's `Failed` state or returned by an operation.
///
/// Messages are flattened to text so states can be cloned as snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("A submission is already in flight")]
    InFlight,

    #[error("Nothing to export: {0}")]
    NoData(String),

    #[error("Export failed: {0}")]
    Export(String),
}

impl SessionError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn no_data(msg: impl Into<String>) -> Self {
        Self::NoData(msg.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            SessionError::Validation(_) => ErrorCategory::Validation,
            SessionError::Transport(_) => ErrorCategory::Transport,
            SessionError::Decode(_) => ErrorCategory::Decode,
            SessionError::InFlight => ErrorCategory::InFlight,
            SessionError::NoData(_) => ErrorCategory::NoData,
            SessionError::Export(_) => ErrorCategory::Export,
        }
    }
}

impl From<ClientError> for SessionError {
    fn from(err: ClientError) -> Self {
        match err.kind() {
            FailureKind::Validation => SessionError::Validation(err.to_string()),
            FailureKind::Transport => SessionError::Transport(err.user_message()),
            FailureKind::Decode => SessionError::Decode(err.to_string()),
        }
    }
}

impl From<ExportError> for SessionError {
    fn from(err: ExportError) -> Self {
        if err.is_decode() {
            SessionError::Decode(err.to_string())
        } else {
            SessionError::Export(err.to_string())
        }
    }
}
