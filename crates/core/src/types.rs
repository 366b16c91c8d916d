use serde::{Deserialize, Serialize};

/// A registered reviewer record. Immutable after registration; `email`
/// is the unique key for roster lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub email: String,
    pub user_id: String,
    /// Content-variant bucket, 1..=5, assigned once at registration.
    pub reviewer_version: u8,
    /// RFC 3339 timestamp of registration.
    pub registration_date: String,
}

impl Identity {
    pub fn new(email: &str, user_id: &str, reviewer_version: u8, registration_date: &str) -> Self {
        Self {
            email: email.to_string(),
            user_id: user_id.to_string(),
            reviewer_version,
            registration_date: registration_date.to_string(),
        }
    }
}

/// One review item as returned by the scrape-job provider.
///
/// The remote payload is not under our control, so every field is
/// optional and unknown fields are carried through untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Review {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Some scrape actors use `review` instead of `text`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Review {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Default::default()
        }
    }

    /// The review body, whichever field the provider populated.
    pub fn body_text(&self) -> &str {
        self.text
            .as_deref()
            .or(self.review.as_deref())
            .unwrap_or("")
    }

    /// Rating rendered for display/export; numbers and strings both occur.
    pub fn rating_text(&self) -> String {
        match &self.rating {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_body_text_fallback() {
        let r: Review = serde_json::from_str(r#"{"review": "great stay"}"#).unwrap();
        assert_eq!(r.body_text(), "great stay");

        let r: Review = serde_json::from_str(r#"{"text": "ok", "review": "ignored"}"#).unwrap();
        assert_eq!(r.body_text(), "ok");

        let r: Review = serde_json::from_str("{}").unwrap();
        assert_eq!(r.body_text(), "");
    }

    #[test]
    fn test_review_tolerates_unknown_fields() {
        let r: Review =
            serde_json::from_str(r#"{"text": "x", "rating": 4.5, "helpfulVotes": 3}"#).unwrap();
        assert_eq!(r.rating_text(), "4.5");
        assert_eq!(r.extra.get("helpfulVotes").unwrap(), 3);
    }

    #[test]
    fn test_identity_camel_case_wire_format() {
        let id = Identity::new("a@b.c", "user_abc123def", 3, "2024-05-01T00:00:00Z");
        let json = serde_json::to_value(&id).unwrap();
        assert_eq!(json["userId"], "user_abc123def");
        assert_eq!(json["reviewerVersion"], 3);
        assert_eq!(json["registrationDate"], "2024-05-01T00:00:00Z");
    }
}
