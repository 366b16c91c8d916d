use reviewlens_compare::{Comparator, Comparison, HttpPageProvider, Selection, SelectionEntry};
use reviewlens_core::{Config, Paths};
use reviewlens_session::{Collector, SessionContext, SnapshotSink};
use reviewlens_storage::UserStore;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub async fn run(raw_entries: &[String]) -> anyhow::Result<()> {
    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;

    // The selection ring keeps the newest entries; overflowing the
    // configured capacity evicts the oldest, exactly like the on-page
    // compare bar.
    let mut selection = Selection::new(config.compare.selection_capacity);
    for raw in raw_entries {
        if let Some(evicted) = selection.add(parse_entry(raw)) {
            println!("Selection full, dropping oldest: {}", evicted.name);
        }
    }

    let provider = Arc::new(HttpPageProvider::new(Duration::from_secs(
        config.compare.fetch_timeout_secs,
    )));
    let comparator = Comparator::new(provider);

    let entries = selection.entries();
    let result = match comparator.compare_entries(&entries).await {
        Ok(result) => result,
        Err(e) => {
            println!("{}", e);
            return Ok(());
        }
    };

    render(&result);

    // Comparison statistics ride along as a telemetry snapshot when a
    // reviewer is logged in.
    let store = UserStore::new(paths);
    if let Some(identity) = store.load_current()? {
        let mut extra = serde_json::Map::new();
        for (i, report) in result.entities.iter().enumerate() {
            extra.insert(format!("hotel{}", i + 1), json!(report.name));
            extra.insert(format!("hotel{}Unique", i + 1), json!(report.unique.len()));
        }
        extra.insert(
            "commonAmenities".to_string(),
            json!(result.common_to_all.len()),
        );
        extra.insert("agreementRate".to_string(), json!(result.agreement_rate));

        let collector = Collector::new(&config.relay.base_url);
        let context = SessionContext::new(identity);
        if let Err(e) = collector
            .deliver(context.snapshot("hotel_comparison", extra))
            .await
        {
            warn!(error = %e, "Comparison snapshot delivery failed");
        }
    }

    Ok(())
}

/// `NAME=URL` names an entry explicitly; a bare URL names itself.
fn parse_entry(raw: &str) -> SelectionEntry {
    if let Some((name, url)) = raw.split_once('=') {
        if url.contains("://") && !name.contains("://") {
            return SelectionEntry::new(name, url);
        }
    }
    SelectionEntry::new(raw, raw)
}

fn render(result: &Comparison) {
    println!();
    println!("Amenity comparison");
    println!("==================");
    for report in &result.entities {
        println!(
            "{:<40} {:>3} amenities, {:>3} unique",
            report.name,
            report.amenities.len(),
            report.unique.len()
        );
    }

    println!();
    for amenity in &result.union_all {
        let shared = result.common_to_all.contains(amenity);
        let marks = result
            .entities
            .iter()
            .map(|e| if e.amenities.contains(amenity) { "✓" } else { "✗" })
            .collect::<Vec<_>>()
            .join("  ");
        println!(
            "  {} {:<42} {}",
            if shared { "✅" } else { "  " },
            amenity,
            marks
        );
    }

    println!();
    println!("Common to all: {}", result.common_to_all.len());
    for report in &result.entities {
        if !report.unique.is_empty() {
            println!(
                "Only at {}: {}",
                report.name,
                report
                    .unique
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    println!(
        "Agreement rate: {:.1}% ({} of {} amenities shared)",
        result.agreement_rate * 100.0,
        result.common_to_all.len(),
        result.union_all.len()
    );
}
