use async_trait::async_trait;
use reviewlens_core::{Error, Result};
use std::time::Duration;
use tracing::warn;

/// Normalized view of a fetched page: the full visible text plus any
/// elements tagged as amenity items.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    pub text: String,
    pub structured_items: Vec<String>,
}

/// Capability seam for reading entity pages; the comparator never
/// touches the network directly, so tests inject canned content.
#[async_trait]
pub trait PageContentProvider: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<PageContent>;
}

pub struct HttpPageProvider {
    client: reqwest::Client,
}

impl HttpPageProvider {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build page HTTP client, using default");
                reqwest::Client::new()
            });
        Self { client }
    }
}

#[async_trait]
impl PageContentProvider for HttpPageProvider {
    async fn fetch(&self, url: &str) -> Result<PageContent> {
        let user_agent = format!("reviewlens/{}", env!("CARGO_PKG_VERSION"));
        let response = self
            .client
            .get(url)
            .header("User-Agent", user_agent)
            .send()
            .await
            .map_err(|e| Error::Compare(format!("Page fetch failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Compare(format!(
                "Page fetch returned {}",
                response.status()
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| Error::Compare(format!("Failed to read page body: {}", e)))?;

        Ok(parse_page(&html))
    }
}

static ITEM_SELECTOR: once_cell::sync::Lazy<scraper::Selector> = once_cell::sync::Lazy::new(|| {
    scraper::Selector::parse(
        r#"[data-test-target="amenity-item"], .amenity-item, .property-amenity"#,
    )
    .unwrap()
});

/// Parse a fetched document into `PageContent`.
///
/// IMPORTANT: Html (scraper) is not Send; parsing happens synchronously
/// here so the document never lives across an await.
pub fn parse_page(html: &str) -> PageContent {
    use scraper::Html;

    let document = Html::parse_document(html);

    let structured_items: Vec<String> = document
        .select(&ITEM_SELECTOR)
        .map(|el| el.text().collect::<Vec<_>>().join("").trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    let text: String = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    PageContent {
        text,
        structured_items,
    }
}
