pub mod chat;
pub mod factory;
pub mod inference;

use async_trait::async_trait;
use reviewlens_core::{Result, Review};

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, reviews: &[Review]) -> Result<String>;
}

pub use chat::ChatSummarizer;
pub use factory::create_summarizer;
pub use inference::InferenceSummarizer;

/// Find the largest byte index <= `max_bytes` that is a valid char boundary.
pub(crate) fn truncate_at_char_boundary(s: &str, max_bytes: usize) -> usize {
    if max_bytes >= s.len() {
        return s.len();
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    end
}

/// Join review bodies with single spaces and clip to the input budget.
pub(crate) fn collect_review_text(reviews: &[Review], max_chars: usize) -> String {
    let joined = reviews
        .iter()
        .map(|r| r.body_text())
        .collect::<Vec<_>>()
        .join(" ");
    let end = truncate_at_char_boundary(&joined, max_chars);
    joined[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let s = "héllo wörld";
        let end = truncate_at_char_boundary(s, 2);
        assert!(s.is_char_boundary(end));
        assert_eq!(&s[..end], "h");

        assert_eq!(truncate_at_char_boundary(s, 1000), s.len());
    }

    #[test]
    fn test_collect_review_text_joins_and_clips() {
        let reviews = vec![
            Review::with_text("first"),
            Review::with_text("second"),
            Review::with_text("third"),
        ];
        assert_eq!(collect_review_text(&reviews, 1000), "first second third");
        assert_eq!(collect_review_text(&reviews, 8), "first se");
    }

    #[test]
    fn test_collect_review_text_uses_body_fallback() {
        let fallback: Review = serde_json::from_str(r#"{"review": "older field"}"#).unwrap();
        let reviews = vec![Review::with_text("newer"), fallback];
        assert_eq!(collect_review_text(&reviews, 1000), "newer older field");
    }
}
