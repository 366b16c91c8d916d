use reviewlens_core::{Error, Identity, Paths, Result};
use std::fs::OpenOptions;
use tracing::debug;

const TRACKING_TABLE: &str = "user_tracking";
const REGISTRATIONS_TABLE: &str = "registrations";
const FINAL_REVIEWS_TABLE: &str = "final_reviews";
const SUMMARIES_TABLE: &str = "summaries";

const TRACKING_HEADERS: [&str; 14] = [
    "Timestamp",
    "UserID",
    "Email",
    "ReviewerVersion",
    "Action",
    "SessionDuration",
    "SummaryViewDuration",
    "CurrentURL",
    "PageTitle",
    "ClickData",
    "SessionStart",
    "SessionEnd",
    "TotalClicks",
    "UniquePages",
];

const REGISTRATION_HEADERS: [&str; 4] = ["email", "userId", "reviewerVersion", "registrationDate"];

const FINAL_REVIEW_HEADERS: [&str; 6] = [
    "URL",
    "ReviewerVersion",
    "Summary",
    "Reviews",
    "DateAdded",
    "ReviewCount",
];

/// One row for the session-tracking table, already flattened to text.
#[derive(Debug, Clone, Default)]
pub struct TrackingRecord {
    pub timestamp: String,
    pub user_id: String,
    pub email: String,
    pub reviewer_version: String,
    pub action: String,
    pub session_duration: String,
    pub summary_view_duration: String,
    pub current_url: String,
    pub page_title: String,
    /// Click buffer serialized as a JSON string; empty when no clicks.
    pub click_data: String,
    pub session_start: String,
    pub session_end: String,
    pub total_clicks: String,
    pub unique_pages: String,
}

#[derive(Debug, Clone)]
pub struct FinalReviewRecord {
    pub url: String,
    pub reviewer_version: String,
    pub summary: String,
    pub reviews: String,
    pub date_added: String,
    pub review_count: u64,
}

/// Append-only CSV tables backing the relay, one file per table.
pub struct TableStore {
    paths: Paths,
}

impl TableStore {
    pub fn new(paths: Paths) -> Self {
        Self { paths }
    }

    pub fn append_tracking(&self, record: &TrackingRecord) -> Result<()> {
        self.append_row(
            TRACKING_TABLE,
            &TRACKING_HEADERS,
            &[
                record.timestamp.as_str(),
                record.user_id.as_str(),
                record.email.as_str(),
                record.reviewer_version.as_str(),
                record.action.as_str(),
                record.session_duration.as_str(),
                record.summary_view_duration.as_str(),
                record.current_url.as_str(),
                record.page_title.as_str(),
                record.click_data.as_str(),
                record.session_start.as_str(),
                record.session_end.as_str(),
                record.total_clicks.as_str(),
                record.unique_pages.as_str(),
            ],
        )
    }

    pub fn append_registration(&self, identity: &Identity) -> Result<()> {
        let version = identity.reviewer_version.to_string();
        self.append_row(
            REGISTRATIONS_TABLE,
            &REGISTRATION_HEADERS,
            &[
                identity.email.as_str(),
                identity.user_id.as_str(),
                version.as_str(),
                identity.registration_date.as_str(),
            ],
        )
    }

    pub fn append_final_review(&self, record: &FinalReviewRecord) -> Result<()> {
        let count = record.review_count.to_string();
        self.append_row(
            FINAL_REVIEWS_TABLE,
            &FINAL_REVIEW_HEADERS,
            &[
                record.url.as_str(),
                record.reviewer_version.as_str(),
                record.summary.as_str(),
                record.reviews.as_str(),
                record.date_added.as_str(),
                count.as_str(),
            ],
        )
    }

    /// Look up a whitelisted summary by exact URL. Absent table or URL
    /// both read as "not whitelisted".
    pub fn lookup_summary(&self, url: &str) -> Result<Option<String>> {
        let path = self.paths.table_file(SUMMARIES_TABLE);
        if !path.exists() {
            return Ok(None);
        }

        let mut reader = csv::Reader::from_path(&path)
            .map_err(|e| Error::Store(format!("Failed to open summaries table: {}", e)))?;
        for record in reader.records() {
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    debug!(error = %e, "Skipping unreadable summaries row");
                    continue;
                }
            };
            if record.get(0) == Some(url) {
                return Ok(Some(record.get(1).unwrap_or_default().to_string()));
            }
        }
        Ok(None)
    }

    /// Seed a summaries row; used by operators to whitelist a URL.
    pub fn append_summary(&self, url: &str, summary: &str) -> Result<()> {
        self.append_row(SUMMARIES_TABLE, &["URL", "Summary"], &[url, summary])
    }

    fn append_row(&self, table: &str, headers: &[&str], fields: &[&str]) -> Result<()> {
        let path = self.paths.table_file(table);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let is_new = !path.exists();

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if is_new {
            writer
                .write_record(headers)
                .map_err(|e| Error::Store(format!("Failed to write {} header: {}", table, e)))?;
        }
        writer
            .write_record(fields)
            .map_err(|e| Error::Store(format!("Failed to append to {}: {}", table, e)))?;
        writer
            .flush()
            .map_err(|e| Error::Store(format!("Failed to flush {}: {}", table, e)))?;
        Ok(())
    }
}
