//! Host configuration.

use std::path::PathBuf;
use std::time::Duration;

use esense_client::{ClientConfig, ClientResult, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

/// Everything the binary needs besides the command line.
///
/// The base URL is kept as given and only validated by
/// [`AppConfig::client_config`], after flags have been applied.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the inference service, unvalidated
    pub api_base: String,
    /// Request timeout
    pub timeout: Duration,
    /// Directory receiving exported files
    pub output_dir: PathBuf,
    /// Period of `ping --watch`
    pub health_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            output_dir: PathBuf::from("."),
            health_interval: Duration::from_secs(10),
        }
    }
}

impl AppConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            api_base: std::env::var("ESENSE_API_BASE")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            timeout: std::env::var("ESENSE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
            output_dir: std::env::var("ESENSE_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            health_interval: Duration::from_secs(
                std::env::var("ESENSE_HEALTH_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|secs| *secs > 0)
                    .unwrap_or(10),
            ),
        }
    }

    /// Apply command-line flags on top of the environment.
    pub fn with_overrides(mut self, api_base: Option<String>, output_dir: Option<PathBuf>) -> Self {
        if let Some(base) = api_base {
            self.api_base = base;
        }
        if let Some(dir) = output_dir {
            self.output_dir = dir;
        }
        self
    }

    /// Validated client configuration.
    pub fn client_config(&self) -> ClientResult<ClientConfig> {
        Ok(ClientConfig::new(&self.api_base)?.with_timeout(self.timeout))
    }
}
