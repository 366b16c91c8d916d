use async_trait::async_trait;
use reviewlens_core::{Error, Result};
use std::time::Duration;
use tracing::{debug, warn};

use crate::context::Snapshot;

/// Destination for telemetry snapshots. The tracker only knows this
/// seam; tests substitute a recording sink.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn deliver(&self, snapshot: Snapshot) -> Result<()>;
}

/// HTTP collector client posting snapshots to the relay. Delivery is
/// best-effort: callers either await (login/logout) or detach and log.
pub struct Collector {
    client: reqwest::Client,
    endpoint: String,
}

impl Collector {
    pub fn new(relay_base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build collector HTTP client, using default");
                reqwest::Client::new()
            });
        Self {
            client,
            endpoint: format!("{}/track-session", relay_base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl SnapshotSink for Collector {
    async fn deliver(&self, snapshot: Snapshot) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&snapshot)
            .send()
            .await
            .map_err(|e| Error::Telemetry(format!("Collector request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Telemetry(format!(
                "Collector returned status {}",
                response.status()
            )));
        }

        debug!(action = %snapshot.action, "Snapshot delivered");
        Ok(())
    }
}
