use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Telemetry error: {0}")]
    Telemetry(String),

    #[error("Scrape error: {0}")]
    Scrape(String),

    #[error("Summarize error: {0}")]
    Summarize(String),

    #[error("Compare error: {0}")]
    Compare(String),

    #[error("Relay error: {0}")]
    Relay(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
