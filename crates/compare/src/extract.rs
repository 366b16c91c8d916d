use std::collections::BTreeSet;

use crate::page::PageContent;
use crate::vocabulary::{is_known_label, VOCABULARY};

/// Derive an entity's amenity set from its page.
///
/// Two passes, unioned: structured amenity items matched exactly against
/// the vocabulary, then a literal substring scan of the full page text
/// as a fallback for pages without tagged items. The set deduplicates.
pub fn extract_amenities(content: &PageContent) -> BTreeSet<String> {
    let mut found = BTreeSet::new();

    for item in &content.structured_items {
        let item = item.trim();
        if is_known_label(item) {
            found.insert(item.to_string());
        }
    }

    for label in VOCABULARY {
        if content.text.contains(label) {
            found.insert((*label).to_string());
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(text: &str, items: &[&str]) -> PageContent {
        PageContent {
            text: text.to_string(),
            structured_items: items.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_structured_pass_matches_exact_labels_only() {
        let c = content("", &["Pool", "Helipad", "Wifi"]);
        let found = extract_amenities(&c);
        assert_eq!(found.len(), 2);
        assert!(found.contains("Pool"));
        assert!(found.contains("Wifi"));
    }

    #[test]
    fn test_text_scan_fallback() {
        let c = content("Guests love the Rooftop terrace and the Spa.", &[]);
        let found = extract_amenities(&c);
        assert!(found.contains("Rooftop terrace"));
        assert!(found.contains("Spa"));
        assert!(!found.contains("Pool"));
    }

    #[test]
    fn test_passes_union_without_duplicates() {
        let c = content("There is a Pool with view here.", &["Pool", "Wifi"]);
        let found = extract_amenities(&c);
        // "Pool" arrives from both passes but is stored once; the text
        // scan also matches the longer "Pool with view" label.
        assert!(found.contains("Pool"));
        assert!(found.contains("Pool with view"));
        assert!(found.contains("Wifi"));
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn test_empty_page_yields_empty_set() {
        assert!(extract_amenities(&PageContent::default()).is_empty());
    }
}
