//! Inference client configuration.

use std::time::Duration;

use url::Url;

use crate::error::{ClientError, ClientResult};

/// Default service address used in local development.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for [`crate::InferenceClient`].
///
/// Built once by the host and handed to the client at construction; the
/// client never consults the environment itself.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the inference service, without trailing slash
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Create a config for the given base URL, validating it.
    pub fn new(base_url: impl AsRef<str>) -> ClientResult<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url.as_ref())?,
            ..Default::default()
        })
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Join an endpoint path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn normalize_base_url(raw: &str) -> ClientResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|e| ClientError::Config(format!("invalid base URL '{}': {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(ClientError::Config(format!(
            "unsupported scheme '{}' in base URL '{}'",
            other, raw
        ))),
    }
}
