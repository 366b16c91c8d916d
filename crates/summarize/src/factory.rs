use reviewlens_core::config::SummarizeConfig;
use std::sync::Arc;
use tracing::warn;

use crate::{ChatSummarizer, InferenceSummarizer, Summarizer};

/// Pick the summarizer backend named in config; unknown names fall back
/// to the chat backend.
pub fn create_summarizer(cfg: &SummarizeConfig) -> Arc<dyn Summarizer> {
    match cfg.backend.as_str() {
        "inference" => Arc::new(InferenceSummarizer::new(cfg)),
        "chat" => Arc::new(ChatSummarizer::new(cfg)),
        other => {
            warn!(backend = %other, "Unknown summarize backend, defaulting to chat");
            Arc::new(ChatSummarizer::new(cfg))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_selection_does_not_panic() {
        let mut cfg = SummarizeConfig::default();
        let _ = create_summarizer(&cfg);
        cfg.backend = "inference".to_string();
        let _ = create_summarizer(&cfg);
        cfg.backend = "bogus".to_string();
        let _ = create_summarizer(&cfg);
    }
}
