//! Service availability monitoring.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info};

use crate::client::InferenceApi;

/// Availability of the inference service as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    Online,
    Offline,
}

impl BackendStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendStatus::Online => "Online",
            BackendStatus::Offline => "Offline",
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, BackendStatus::Online)
    }
}

impl fmt::Display for BackendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Probes the service's health endpoint.
#[derive(Clone)]
pub struct HealthMonitor {
    api: Arc<dyn InferenceApi>,
}

impl HealthMonitor {
    pub fn new(api: Arc<dyn InferenceApi>) -> Self {
        Self { api }
    }

    /// Probe once. Any failure collapses to `Offline`.
    pub async fn probe(&self) -> BackendStatus {
        if self.api.check_health().await {
            BackendStatus::Online
        } else {
            BackendStatus::Offline
        }
    }

    /// Probe on a fixed interval in a background task.
    ///
    /// The first probe runs immediately. The task stops once every receiver
    /// has been dropped.
    pub fn watch(&self, period: Duration) -> (watch::Receiver<BackendStatus>, JoinHandle<()>) {
        let (tx, rx) = watch::channel(BackendStatus::Offline);
        let monitor = self.clone();

        let handle = tokio::spawn(async move {
            info!("Starting health monitor (interval: {:?})", period);
            let mut ticker = interval(period);

            loop {
                ticker.tick().await;
                let status = monitor.probe().await;
                debug!(status = %status, "Health probe finished");

                let changed = tx.send_if_modified(|current| {
                    if *current != status {
                        *current = status;
                        true
                    } else {
                        false
                    }
                });
                if changed {
                    info!(status = %status, "Inference service status changed");
                }
                if tx.is_closed() {
                    debug!("Health monitor has no subscribers, stopping");
                    break;
                }
            }
        });

        (rx, handle)
    }
}
