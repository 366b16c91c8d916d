use async_trait::async_trait;
use reviewlens_core::config::SummarizeConfig;
use reviewlens_core::{Error, Result, Review};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::{collect_review_text, Summarizer};

/// Analyst prompt; the raw review text is appended after the template.
const PROMPT_TEMPLATE: &str = r#"You are a review analyst. Summarize the following product or attraction reviews into a structured format with emoji headers and clear sections.

Please format the output exactly like this:
🏷️ Attraction:
[Insert attraction name, if known]

⭐ Overall Rating:
[Summarize general sentiment — mention if reviews are mostly positive, mixed, or negative]

🏆 Key Highlights:
1. [Theme or category]
  - [Detail 1]
  - [Detail 2]
  - [Detail 3]

2. [Next theme or category]
  - [Detail 1]
  - [Detail 2]

⚠️ Common Criticisms:
1. [Category]
  - [Critical observation 1]
  - [Critical observation 2]

💡 Visitor Tips:
- [Tip 1]
- [Tip 2]

✅ Recommended For:
- [Audience 1]
- [Audience 2]

Here are the reviews:
"#;

/// Summarizer backed by an OpenAI-compatible chat/completions endpoint.
pub struct ChatSummarizer {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_input_chars: usize,
}

impl ChatSummarizer {
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
            temperature: cfg.temperature,
            max_input_chars: cfg.max_input_chars,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// The first choice's message content is the summary. An API-level
/// `error` object fails the call even under a 2xx status.
fn parse_chat_body(raw: &str) -> Result<String> {
    let parsed: ChatResponse = serde_json::from_str(raw)
        .map_err(|e| Error::Summarize(format!("Failed to parse response: {}", e)))?;

    if let Some(err) = parsed.error {
        return Err(Error::Summarize(format!("API error: {}", err)));
    }

    Ok(parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_else(|| "No summary generated.".to_string()))
}

#[async_trait]
impl Summarizer for ChatSummarizer {
    async fn summarize(&self, reviews: &[Review]) -> Result<String> {
        let raw_text = collect_review_text(reviews, self.max_input_chars);
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: format!("{}{}", PROMPT_TEMPLATE, raw_text),
            }],
            temperature: self.temperature,
        };

        let url = format!("{}/chat/completions", self.api_base);
        info!(url = %url, model = %self.model, reviews = reviews.len(), "Requesting review summary");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Summarize(format!("Request failed: {}", e)))?;

        let status = response.status();
        let raw_body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            error!(status = %status, body = %raw_body, "Summarizer API error");
            return Err(Error::Summarize(format!("API error {}: {}", status, raw_body)));
        }

        parse_chat_body(&raw_body)
    }
}
