use chrono::Utc;
use reviewlens_core::config::ScrapeConfig;
use reviewlens_core::{Error, Result, Review};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::poll::{poll_until_terminal, PollPolicy, RunStatus};

/// Identifies a submitted scrape job and its output dataset.
#[derive(Debug, Clone)]
pub struct JobHandle {
    pub run_id: String,
    pub dataset_id: String,
}

/// Client for the asynchronous scrape-job provider: submit a run, poll
/// it to a terminal state, then pull the output collection.
pub struct ScrapeClient {
    client: reqwest::Client,
    api_base: String,
    actor: String,
    token: String,
    max_reviews: u32,
    policy: PollPolicy,
}

impl ScrapeClient {
    pub fn new(cfg: &ScrapeConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build scrape HTTP client, using default");
                reqwest::Client::new()
            });
        Self {
            client,
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            actor: cfg.actor.clone(),
            token: cfg.token.clone(),
            max_reviews: cfg.max_reviews,
            policy: PollPolicy {
                interval: Duration::from_secs(cfg.poll_interval_secs),
                max_attempts: cfg.max_poll_attempts,
            },
        }
    }

    /// Submit a scrape run for the target page. The `uniqueKey` is a
    /// fresh millisecond timestamp so a resubmission is a new job. A
    /// response without a run id is a hard failure.
    pub async fn start(&self, target_url: &str) -> Result<JobHandle> {
        let url = format!("{}/acts/{}/runs", self.api_base, self.actor);
        let unique_key = Utc::now().timestamp_millis().to_string();
        let payload = serde_json::json!({
            "startUrls": [{ "url": target_url, "uniqueKey": unique_key }],
            "maxReviews": self.max_reviews,
            "useStealth": true,
            "proxyConfig": { "useApifyProxy": true }
        });

        let response = self
            .client
            .post(&url)
            .query(&[("token", self.token.as_str())])
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Scrape(format!("Failed to start scrape job: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Scrape(format!(
                "Scrape provider error {}: {}",
                status, body
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| Error::Scrape(format!("Failed to parse start response: {}", e)))?;

        let run_id = data["data"]["id"]
            .as_str()
            .ok_or_else(|| Error::Scrape("Start response carries no run id".to_string()))?
            .to_string();
        let dataset_id = data["data"]["defaultDatasetId"]
            .as_str()
            .ok_or_else(|| Error::Scrape("Start response carries no dataset id".to_string()))?
            .to_string();

        info!(run_id = %run_id, url = %target_url, "Scrape job started");
        Ok(JobHandle { run_id, dataset_id })
    }

    pub async fn status(&self, handle: &JobHandle) -> Result<RunStatus> {
        let url = format!("{}/actor-runs/{}", self.api_base, handle.run_id);
        let response = self
            .client
            .get(&url)
            .query(&[("token", self.token.as_str())])
            .send()
            .await
            .map_err(|e| Error::Scrape(format!("Status check failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Scrape(format!(
                "Status check returned {}",
                response.status()
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| Error::Scrape(format!("Failed to parse status response: {}", e)))?;
        Ok(RunStatus::parse(data["data"]["status"].as_str().unwrap_or("")))
    }

    pub async fn await_completion(&self, handle: &JobHandle) -> Result<()> {
        poll_until_terminal(|| self.status(handle), &self.policy).await
    }

    /// Pull the completed job's output. A payload that is not a list
    /// reads as an empty result, not a fault; individual items that do
    /// not parse are skipped.
    pub async fn fetch_results(&self, handle: &JobHandle) -> Result<Vec<Review>> {
        let url = format!("{}/datasets/{}/items", self.api_base, handle.dataset_id);
        let response = self
            .client
            .get(&url)
            .query(&[("token", self.token.as_str())])
            .send()
            .await
            .map_err(|e| Error::Scrape(format!("Failed to fetch results: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Scrape(format!(
                "Result fetch returned {}",
                response.status()
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| Error::Scrape(format!("Failed to parse results payload: {}", e)))?;

        let items = match payload.as_array() {
            Some(items) => items.clone(),
            None => {
                warn!(run_id = %handle.run_id, "Dataset payload is not a list, returning empty");
                return Ok(Vec::new());
            }
        };

        let mut reviews = Vec::new();
        for item in items {
            match serde_json::from_value::<Review>(item) {
                Ok(review) => reviews.push(review),
                Err(e) => debug!(error = %e, "Skipping unparseable review item"),
            }
        }

        debug!(count = reviews.len(), run_id = %handle.run_id, "Fetched scrape results");
        Ok(reviews)
    }

    /// Start, await, fetch. Callers that prefer a lossy policy degrade
    /// any error to an empty result at the call site.
    pub async fn fetch_reviews(&self, target_url: &str) -> Result<Vec<Review>> {
        let handle = self.start(target_url).await?;
        self.await_completion(&handle).await?;
        self.fetch_results(&handle).await
    }
}
