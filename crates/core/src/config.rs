use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::paths::Paths;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayConfig {
    /// Base URL used by clients (collector, registration, archival).
    #[serde(default = "default_relay_base_url")]
    pub base_url: String,
    /// Bind address for `reviewlens relay`.
    #[serde(default = "default_relay_host")]
    pub host: String,
    #[serde(default = "default_relay_port")]
    pub port: u16,
}

fn default_relay_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_relay_host() -> String {
    "127.0.0.1".to_string()
}

fn default_relay_port() -> u16 {
    3000
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            base_url: default_relay_base_url(),
            host: default_relay_host(),
            port: default_relay_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryConfig {
    /// Quiet period after the last click/scroll before an activity flush.
    #[serde(default = "default_debounce_secs")]
    pub debounce_secs: u64,
    /// Keep-alive interval; fires even with zero activity.
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
}

fn default_debounce_secs() -> u64 {
    2
}

fn default_heartbeat_secs() -> u64 {
    30
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            debounce_secs: default_debounce_secs(),
            heartbeat_secs: default_heartbeat_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeConfig {
    #[serde(default = "default_scrape_api_base")]
    pub api_base: String,
    /// Actor identifier of the review scraper.
    #[serde(default = "default_scrape_actor")]
    pub actor: String,
    /// API token, carried as a query credential.
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_max_reviews")]
    pub max_reviews: u32,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
}

fn default_scrape_api_base() -> String {
    "https://api.apify.com/v2".to_string()
}

fn default_scrape_actor() -> String {
    "maxcopell~tripadvisor-reviews".to_string()
}

fn default_max_reviews() -> u32 {
    30
}

fn default_poll_interval_secs() -> u64 {
    4
}

fn default_max_poll_attempts() -> u32 {
    15
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            api_base: default_scrape_api_base(),
            actor: default_scrape_actor(),
            token: String::new(),
            max_reviews: default_max_reviews(),
            poll_interval_secs: default_poll_interval_secs(),
            max_poll_attempts: default_max_poll_attempts(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeConfig {
    /// "chat" (OpenAI-compatible chat/completions) or "inference"
    /// (hosted-model inference endpoint).
    #[serde(default = "default_summarize_backend")]
    pub backend: String,
    #[serde(default = "default_summarize_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_summarize_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Review text handed to the model is clipped to this many chars.
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

fn default_summarize_backend() -> String {
    "chat".to_string()
}

fn default_summarize_api_base() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_summarize_model() -> String {
    "llama3-70b-8192".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_input_chars() -> usize {
    3000
}

impl Default for SummarizeConfig {
    fn default() -> Self {
        Self {
            backend: default_summarize_backend(),
            api_base: default_summarize_api_base(),
            api_key: String::new(),
            model: default_summarize_model(),
            temperature: default_temperature(),
            max_input_chars: default_max_input_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareConfig {
    /// How many entities can be queued for comparison (2 or 3).
    #[serde(default = "default_selection_capacity")]
    pub selection_capacity: usize,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_selection_capacity() -> usize {
    2
}

fn default_fetch_timeout_secs() -> u64 {
    15
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            selection_capacity: default_selection_capacity(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub scrape: ScrapeConfig,
    #[serde(default)]
    pub summarize: SummarizeConfig,
    #[serde(default)]
    pub compare: CompareConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn load_or_default(paths: &Paths) -> Result<Self> {
        let config_path = paths.config_file();
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.telemetry.debounce_secs, 2);
        assert_eq!(cfg.telemetry.heartbeat_secs, 30);
        assert_eq!(cfg.scrape.poll_interval_secs, 4);
        assert_eq!(cfg.scrape.max_poll_attempts, 15);
        assert_eq!(cfg.compare.selection_capacity, 2);
        assert_eq!(cfg.summarize.max_input_chars, 3000);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let raw = r#"{
  "scrape": { "token": "tok_123", "maxReviews": 50 },
  "relay": { "baseUrl": "http://relay.local:9000" }
}"#;
        let cfg: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(cfg.scrape.token, "tok_123");
        assert_eq!(cfg.scrape.max_reviews, 50);
        assert_eq!(cfg.scrape.poll_interval_secs, 4);
        assert_eq!(cfg.relay.base_url, "http://relay.local:9000");
        assert_eq!(cfg.relay.port, 3000);
    }

    #[test]
    fn test_round_trip() {
        let cfg = Config::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.summarize.model, cfg.summarize.model);
        assert_eq!(back.compare.selection_capacity, cfg.compare.selection_capacity);
    }
}
