use reviewlens_core::{Error, Identity, Result, Review};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Client side of the relay contract: registration announcements,
/// final-review archival, and the summary whitelist lookup.
pub struct RelayClient {
    client: reqwest::Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build relay HTTP client, using default");
                reqwest::Client::new()
            });
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn register(&self, identity: &Identity) -> Result<()> {
        let url = format!("{}/register", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(identity)
            .send()
            .await
            .map_err(|e| Error::Relay(format!("Registration request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Relay(format!(
                "Registration returned status {}",
                response.status()
            )));
        }
        debug!(email = %identity.email, "Registration announced to relay");
        Ok(())
    }

    pub async fn archive_final_review(
        &self,
        page_url: &str,
        reviewer_version: u8,
        summary: &str,
        reviews: &[Review],
    ) -> Result<()> {
        let url = format!("{}/final-review", self.base_url);
        let body = serde_json::json!({
            "url": page_url,
            "reviewerVersion": reviewer_version,
            "summary": summary,
            "reviews": reviews,
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Relay(format!("Archive request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Relay(format!(
                "Archive returned status {}",
                response.status()
            )));
        }
        debug!(url = %page_url, count = reviews.len(), "Final review archived");
        Ok(())
    }

    /// Whitelist lookup: 200 carries a cached summary, 403 means the URL
    /// is not whitelisted; anything else is an error.
    pub async fn lookup_summary(&self, page_url: &str) -> Result<Option<String>> {
        let url = format!("{}/summary", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("url", page_url)])
            .send()
            .await
            .map_err(|e| Error::Relay(format!("Summary lookup failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::FORBIDDEN {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Error::Relay(format!(
                "Summary lookup returned status {}",
                response.status()
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| Error::Relay(format!("Failed to parse summary response: {}", e)))?;
        Ok(data["summary"].as_str().map(|s| s.to_string()))
    }
}
