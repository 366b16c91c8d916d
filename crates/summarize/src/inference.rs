use async_trait::async_trait;
use reviewlens_core::config::SummarizeConfig;
use reviewlens_core::{Error, Result, Review};
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

use crate::{collect_review_text, Summarizer};

/// Summarizer backed by a hosted-model inference endpoint
/// (`POST {apiBase}/models/{model}` with `{"inputs": ...}`).
pub struct InferenceSummarizer {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    max_input_chars: usize,
}

impl InferenceSummarizer {
    pub fn new(cfg: &SummarizeConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build summarizer HTTP client, using default");
                reqwest::Client::new()
            });
        Self {
            client,
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            max_input_chars: cfg.max_input_chars,
        }
    }
}

/// The payload is a list whose first element carries `summary_text`.
fn parse_inference_body(raw: &str) -> Result<String> {
    let data: Value = serde_json::from_str(raw)
        .map_err(|e| Error::Summarize(format!("Failed to parse response: {}", e)))?;

    if let Some(err) = data.get("error") {
        return Err(Error::Summarize(format!("API error: {}", err)));
    }

    Ok(data[0]["summary_text"]
        .as_str()
        .unwrap_or("No summary generated.")
        .to_string())
}

#[async_trait]
impl Summarizer for InferenceSummarizer {
    async fn summarize(&self, reviews: &[Review]) -> Result<String> {
        let raw_text = collect_review_text(reviews, self.max_input_chars);
        let url = format!("{}/models/{}", self.api_base, self.model);
        info!(url = %url, reviews = reviews.len(), "Requesting review summary");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "inputs": format!("Summarize the following travel reviews:\n\n{}", raw_text)
            }))
            .send()
            .await
            .map_err(|e| Error::Summarize(format!("Request failed: {}", e)))?;

        let status = response.status();
        let raw_body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(Error::Summarize(format!("API error {}: {}", status, raw_body)));
        }

        parse_inference_body(&raw_body)
    }
}
