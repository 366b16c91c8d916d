use chrono::{DateTime, Utc};
use reviewlens_core::Identity;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::dwell::DwellClock;

/// One pointer click, captured with a DOM target descriptor. Appended to
/// the session buffer, never mutated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    pub timestamp: String,
    pub target: String,
    pub target_id: String,
    pub target_class: String,
    /// First 100 chars of the target's text content.
    pub target_text: String,
    pub url: String,
    pub page_title: String,
    pub x: i32,
    pub y: i32,
}

impl ClickEvent {
    pub fn at(url: &str, page_title: &str, x: i32, y: i32) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            url: url.to_string(),
            page_title: page_title.to_string(),
            x,
            y,
            ..Default::default()
        }
    }
}

/// One telemetry payload describing accumulated session state at a point
/// in time. Field names match the collector's wire contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub user_id: String,
    pub email: String,
    pub reviewer_version: u8,
    pub timestamp: String,
    pub action: String,
    /// Seconds since session start.
    pub session_duration: f64,
    /// Seconds the summary element has been on screen, cumulative.
    pub summary_view_duration: f64,
    pub current_url: String,
    pub page_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_clicks: Option<Vec<ClickEvent>>,
    pub session_start: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_end: Option<String>,
    pub total_clicks: usize,
    pub unique_pages: usize,
    /// Action-specific fields (e.g. comparison statistics), flattened
    /// into the payload.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// In-memory state of one authenticated browsing period. Owned by the
/// tracker; dropped (not patched field-by-field) on logout.
#[derive(Debug)]
pub struct SessionContext {
    pub identity: Identity,
    pub started_at: DateTime<Utc>,
    pub clicks: Vec<ClickEvent>,
    pub unique_pages: HashSet<String>,
    pub dwell: DwellClock,
    pub current_url: String,
    pub page_title: String,
}

impl SessionContext {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            started_at: Utc::now(),
            clicks: Vec::new(),
            unique_pages: HashSet::new(),
            dwell: DwellClock::new(),
            current_url: String::new(),
            page_title: String::new(),
        }
    }

    pub fn record_click(&mut self, click: ClickEvent) {
        self.unique_pages.insert(click.url.clone());
        self.clicks.push(click);
    }

    pub fn visit(&mut self, url: &str, title: &str) {
        self.current_url = url.to_string();
        self.page_title = title.to_string();
        self.unique_pages.insert(url.to_string());
    }

    pub fn snapshot(
        &self,
        action: &str,
        extra: serde_json::Map<String, serde_json::Value>,
    ) -> Snapshot {
        let now = Utc::now();
        Snapshot {
            user_id: self.identity.user_id.clone(),
            email: self.identity.email.clone(),
            reviewer_version: self.identity.reviewer_version,
            timestamp: now.to_rfc3339(),
            action: action.to_string(),
            session_duration: (now - self.started_at).num_milliseconds() as f64 / 1000.0,
            summary_view_duration: self.dwell.total_secs(),
            current_url: self.current_url.clone(),
            page_title: self.page_title.clone(),
            page_clicks: if self.clicks.is_empty() {
                None
            } else {
                Some(self.clicks.clone())
            },
            session_start: self.started_at.to_rfc3339(),
            session_end: if action == "logout" {
                Some(now.to_rfc3339())
            } else {
                None
            },
            total_clicks: self.clicks.len(),
            unique_pages: self.unique_pages.len(),
            extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity::new("t@example.com", "user_abc123def", 2, "2024-05-01T00:00:00Z")
    }

    #[test]
    fn test_click_buffer_and_unique_pages() {
        let mut ctx = SessionContext::new(identity());
        ctx.record_click(ClickEvent::at("https://t.test/a", "A", 10, 20));
        ctx.record_click(ClickEvent::at("https://t.test/a", "A", 11, 21));
        ctx.record_click(ClickEvent::at("https://t.test/b", "B", 12, 22));

        assert_eq!(ctx.clicks.len(), 3);
        assert_eq!(ctx.unique_pages.len(), 2);
    }

    #[test]
    fn test_snapshot_omits_empty_click_buffer() {
        let ctx = SessionContext::new(identity());
        let snap = ctx.snapshot("login", serde_json::Map::new());
        assert!(snap.page_clicks.is_none());

        let json = serde_json::to_value(&snap).unwrap();
        assert!(json.get("pageClicks").is_none());
        assert_eq!(json["action"], "login");
        assert_eq!(json["reviewerVersion"], 2);
    }

    #[test]
    fn test_logout_snapshot_sets_session_end() {
        let ctx = SessionContext::new(identity());
        let snap = ctx.snapshot("logout", serde_json::Map::new());
        assert!(snap.session_end.is_some());

        let snap = ctx.snapshot("activity_sync", serde_json::Map::new());
        assert!(snap.session_end.is_none());
    }

    #[test]
    fn test_snapshot_carries_extra_fields_flattened() {
        let ctx = SessionContext::new(identity());
        let mut extra = serde_json::Map::new();
        extra.insert("commonAmenities".to_string(), serde_json::json!(4));
        let snap = ctx.snapshot("hotel_comparison", extra);

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["commonAmenities"], 4);
    }
}
