use reviewlens_core::{Error, Result};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::warn;

use crate::diff::{compare, Comparison, EntityAmenities};
use crate::extract::extract_amenities;
use crate::page::PageContentProvider;
use crate::selection::SelectionEntry;

/// Builds a feature-parity view across 2 or 3 selected entities.
pub struct Comparator {
    provider: Arc<dyn PageContentProvider>,
}

impl Comparator {
    pub fn new(provider: Arc<dyn PageContentProvider>) -> Self {
        Self { provider }
    }

    /// Fetch every entity's page concurrently, derive amenity sets, and
    /// compute the comparison. Completion order does not affect the
    /// output; a failed fetch degrades that entity to an empty set.
    pub async fn compare_entries(&self, entries: &[SelectionEntry]) -> Result<Comparison> {
        if !(2..=3).contains(&entries.len()) {
            return Err(Error::Validation(format!(
                "Comparison needs 2 or 3 entities, got {}",
                entries.len()
            )));
        }

        let fetches = entries.iter().map(|entry| {
            let provider = self.provider.clone();
            let url = entry.url.clone();
            async move { provider.fetch(&url).await }
        });
        let pages = futures::future::join_all(fetches).await;

        let sets: Vec<EntityAmenities> = entries
            .iter()
            .zip(pages)
            .map(|(entry, page)| {
                let amenities = match page {
                    Ok(content) => extract_amenities(&content),
                    Err(e) => {
                        warn!(error = %e, url = %entry.url, "Amenity fetch failed, treating as empty");
                        BTreeSet::new()
                    }
                };
                EntityAmenities {
                    name: entry.name.clone(),
                    amenities,
                }
            })
            .collect();

        Ok(compare(&sets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageContent;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct StaticProvider {
        pages: HashMap<String, PageContent>,
    }

    #[async_trait]
    impl PageContentProvider for StaticProvider {
        async fn fetch(&self, url: &str) -> Result<PageContent> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| Error::Compare(format!("no page for {}", url)))
        }
    }

    fn provider(pages: &[(&str, &str)]) -> Arc<StaticProvider> {
        Arc::new(StaticProvider {
            pages: pages
                .iter()
                .map(|(url, text)| {
                    (
                        url.to_string(),
                        PageContent {
                            text: text.to_string(),
                            structured_items: Vec::new(),
                        },
                    )
                })
                .collect(),
        })
    }

    fn entry(name: &str, url: &str) -> SelectionEntry {
        SelectionEntry::new(name, url)
    }

    #[tokio::test]
    async fn test_compare_two_entities() {
        let provider = provider(&[
            ("https://t.test/a", "Pool and Wifi throughout"),
            ("https://t.test/b", "Wifi plus a Spa"),
        ]);
        let comparator = Comparator::new(provider);

        let result = comparator
            .compare_entries(&[entry("A", "https://t.test/a"), entry("B", "https://t.test/b")])
            .await
            .unwrap();

        assert!(result.common_to_all.contains("Wifi"));
        assert!(result.entities[0].unique.contains("Pool"));
        assert!(result.entities[1].unique.contains("Spa"));
    }

    #[tokio::test]
    async fn test_failed_fetch_degrades_to_empty_set() {
        let provider = provider(&[("https://t.test/a", "Pool")]);
        let comparator = Comparator::new(provider);

        let result = comparator
            .compare_entries(&[
                entry("A", "https://t.test/a"),
                entry("B", "https://t.test/missing"),
            ])
            .await
            .unwrap();

        assert!(result.common_to_all.is_empty());
        assert!(result.entities[0].unique.contains("Pool"));
        assert!(result.entities[1].amenities.is_empty());
    }

    #[tokio::test]
    async fn test_entry_count_is_validated() {
        let comparator = Comparator::new(provider(&[]));

        let err = comparator
            .compare_entries(&[entry("A", "https://t.test/a")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = comparator.compare_entries(&[]).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
