use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use reviewlens_core::{Error, Identity, Paths, Result};
use reviewlens_storage::{FinalReviewRecord, TableStore, TrackingRecord};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

/// Archival caps applied before a review batch is flattened into one cell.
const MAX_ARCHIVED_REVIEWS: usize = 50;
const MAX_ARCHIVED_CHARS: usize = 50_000;
const REVIEW_DELIMITER: &str = "\n---\n";

#[derive(Clone)]
struct RelayState {
    tables: Arc<TableStore>,
}

pub fn router(tables: Arc<TableStore>) -> Router {
    Router::new()
        .route("/track-session", post(track_session))
        .route("/register", post(register))
        .route("/summary", get(summary))
        .route("/final-review", post(final_review))
        .layer(CorsLayer::permissive())
        .with_state(RelayState { tables })
}

pub async fn serve(paths: Paths, host: &str, port: u16) -> Result<()> {
    paths.ensure_dirs()?;
    let tables = Arc::new(TableStore::new(paths));
    let app = router(tables);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Relay(format!("Failed to bind {}: {}", addr, e)))?;
    info!(addr = %addr, "Relay listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::Relay(format!("Server error: {}", e)))?;
    Ok(())
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ── /track-session ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackSessionBody {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    reviewer_version: Value,
    #[serde(default)]
    timestamp: String,
    #[serde(default)]
    action: String,
    #[serde(default)]
    session_duration: f64,
    #[serde(default)]
    summary_view_duration: f64,
    #[serde(default)]
    current_url: String,
    #[serde(default)]
    page_title: String,
    #[serde(default)]
    page_clicks: Option<Value>,
    #[serde(default)]
    session_start: Option<String>,
    #[serde(default)]
    session_end: Option<String>,
    #[serde(default)]
    total_clicks: u64,
    #[serde(default)]
    unique_pages: u64,
}

async fn track_session(
    State(state): State<RelayState>,
    Json(body): Json<TrackSessionBody>,
) -> Response {
    let record = TrackingRecord {
        timestamp: body.timestamp,
        user_id: body.user_id,
        email: body.email,
        reviewer_version: value_to_text(&body.reviewer_version),
        action: body.action,
        session_duration: body.session_duration.to_string(),
        summary_view_duration: body.summary_view_duration.to_string(),
        current_url: body.current_url,
        page_title: body.page_title,
        click_data: body.page_clicks.map(|v| v.to_string()).unwrap_or_default(),
        session_start: body.session_start.unwrap_or_default(),
        session_end: body.session_end.unwrap_or_default(),
        total_clicks: body.total_clicks.to_string(),
        unique_pages: body.unique_pages.to_string(),
    };

    match state.tables.append_tracking(&record) {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "result": "success",
                "message": "Session data saved to tracking table"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to track session");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to track session", "details": e.to_string()})),
            )
                .into_response()
        }
    }
}

// ── /register ───────────────────────────────────────────────────────────────

async fn register(State(state): State<RelayState>, Json(identity): Json<Identity>) -> Response {
    match state.tables.append_registration(&identity) {
        Ok(()) => (StatusCode::OK, Json(json!({"result": "success"}))).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to archive registration");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to archive registration"})),
            )
                .into_response()
        }
    }
}

// ── /summary ────────────────────────────────────────────────────────────────

async fn summary(
    State(state): State<RelayState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(url) = params.get("url") else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Missing URL parameter"})),
        )
            .into_response();
    };

    match state.tables.lookup_summary(url) {
        Ok(Some(summary)) => (
            StatusCode::OK,
            Json(json!({"whitelisted": true, "summary": summary})),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::FORBIDDEN,
            Json(json!({"whitelisted": false, "summary": null, "error": "URL not whitelisted"})),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to read summaries table");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Internal Server Error"})),
            )
                .into_response()
        }
    }
}

// ── /final-review ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinalReviewBody {
    #[serde(default)]
    url: String,
    #[serde(default)]
    reviewer_version: Value,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    reviews: Option<Value>,
}

/// Flatten an incoming review batch into one archival cell.
///
/// Arrays keep at most `MAX_ARCHIVED_REVIEWS` entries (text extracted,
/// empties dropped) joined by the delimiter, while the reported count is
/// the full batch size. Plain strings are clipped to the char budget;
/// anything else is stored as its JSON rendering.
fn flatten_reviews(reviews: &Value) -> (String, u64) {
    match reviews {
        Value::Array(items) => {
            let joined = items
                .iter()
                .take(MAX_ARCHIVED_REVIEWS)
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    other => other
                        .get("text")
                        .and_then(|t| t.as_str())
                        .map(|s| s.to_string()),
                })
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(REVIEW_DELIMITER);
            (joined, items.len() as u64)
        }
        Value::String(s) => {
            let mut end = MAX_ARCHIVED_CHARS.min(s.len());
            while end > 0 && !s.is_char_boundary(end) {
                end -= 1;
            }
            (s[..end].to_string(), 1)
        }
        other => (other.to_string(), 1),
    }
}

async fn final_review(
    State(state): State<RelayState>,
    Json(body): Json<FinalReviewBody>,
) -> Response {
    let Some(reviews) = body.reviews else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Reviews data is required"})),
        )
            .into_response();
    };

    let (flattened, review_count) = flatten_reviews(&reviews);
    let record = FinalReviewRecord {
        url: body.url,
        reviewer_version: value_to_text(&body.reviewer_version),
        summary: body.summary.unwrap_or_default(),
        reviews: flattened,
        date_added: Utc::now().to_rfc3339(),
        review_count,
    };

    match state.tables.append_final_review(&record) {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "result": "success",
                "message": "Reviews successfully archived",
                "reviewCount": review_count
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to archive final review");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to archive final review", "details": e.to_string()})),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_router() -> (TempDir, Router, Paths) {
        let temp = TempDir::new().unwrap();
        let paths = Paths::with_base(temp.path().to_path_buf());
        paths.ensure_dirs().unwrap();
        let tables = Arc::new(TableStore::new(paths.clone()));
        (temp, router(tables), paths)
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_flatten_caps_at_fifty_entries() {
        let items: Vec<Value> = (0..60).map(|i| json!({"text": format!("r{}", i)})).collect();
        let (joined, count) = flatten_reviews(&Value::Array(items));

        assert_eq!(count, 60);
        assert_eq!(joined.matches(REVIEW_DELIMITER).count(), 49);
        assert!(joined.ends_with("r49"));
    }

    #[test]
    fn test_flatten_drops_empty_entries_and_accepts_strings() {
        let items = json!(["first", {"text": ""}, {"text": "second"}, {"rating": 5}]);
        let (joined, count) = flatten_reviews(&items);
        assert_eq!(joined, format!("first{}second", REVIEW_DELIMITER));
        assert_eq!(count, 4);
    }

    #[test]
    fn test_flatten_clips_long_strings() {
        let long = "x".repeat(60_000);
        let (clipped, count) = flatten_reviews(&Value::String(long));
        assert_eq!(clipped.len(), MAX_ARCHIVED_CHARS);
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_track_session_round_trip() {
        let (_temp, app, paths) = test_router();
        let response = app
            .oneshot(json_request(
                "/track-session",
                json!({
                    "userId": "user_abc",
                    "email": "a@example.com",
                    "reviewerVersion": 2,
                    "timestamp": "2024-05-01T10:00:00Z",
                    "action": "login",
                    "sessionDuration": 0.0,
                    "summaryViewDuration": 0.0,
                    "currentUrl": "https://t.test/a",
                    "pageTitle": "A",
                    "totalClicks": 0,
                    "uniquePages": 1
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["result"], "success");

        let table = std::fs::read_to_string(paths.table_file("user_tracking")).unwrap();
        assert!(table.contains("a@example.com"));
        assert!(table.contains("login"));
    }

    #[tokio::test]
    async fn test_summary_requires_url_param() {
        let (_temp, app, _paths) = test_router();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/summary")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_summary_whitelist_lookup() {
        let (_temp, app, paths) = test_router();
        TableStore::new(paths)
            .append_summary("https://t.test/known", "Cached summary.")
            .unwrap();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/summary?url=https://t.test/known")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["whitelisted"], true);
        assert_eq!(body["summary"], "Cached summary.");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/summary?url=https://t.test/unknown")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_final_review_requires_reviews() {
        let (_temp, app, _paths) = test_router();
        let response = app
            .oneshot(json_request(
                "/final-review",
                json!({"url": "https://t.test/a", "reviewerVersion": 1, "summary": "s"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_final_review_archives_batch() {
        let (_temp, app, paths) = test_router();
        let response = app
            .oneshot(json_request(
                "/final-review",
                json!({
                    "url": "https://t.test/a",
                    "reviewerVersion": 3,
                    "summary": "Nice place.",
                    "reviews": [{"text": "Loved it"}, {"text": "Would return"}]
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["reviewCount"], 2);

        let table = std::fs::read_to_string(paths.table_file("final_reviews")).unwrap();
        assert!(table.contains("Loved it"));
        assert!(table.contains("Nice place."));
    }
}
