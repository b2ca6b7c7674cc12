//! Inference client error types.

use thiserror::Error;

use esense_models::ModelError;

pub type ClientResult<T> = Result<T, ClientError>;

/// Failure category, used by callers to tell the failure classes apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Caller-side precondition violated; nothing was sent.
    Validation,
    /// The service could not be reached or answered with a non-success status.
    Transport,
    /// The service answered but the body was not the expected shape.
    Decode,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            ClientError::Config(_) | ClientError::InvalidRequest(_) => FailureKind::Validation,
            ClientError::Network(_) | ClientError::Status { .. } => FailureKind::Transport,
            ClientError::InvalidResponse(_) | ClientError::Json(_) => FailureKind::Decode,
        }
    }

    /// Message suitable for showing to the user.
    ///
    /// For a non-success status this is the service's own message when it
    /// sent one.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<ModelError> for ClientError {
    fn from(err: ModelError) -> Self {
        ClientError::InvalidResponse(err.to_string())
    }
}
