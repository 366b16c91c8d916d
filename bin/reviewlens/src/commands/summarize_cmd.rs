use reviewlens_core::{Config, Paths, Review};
use reviewlens_relay::RelayClient;
use reviewlens_scrape::ScrapeClient;
use reviewlens_storage::UserStore;
use reviewlens_summarize::create_summarizer;
use std::path::{Path, PathBuf};
use tracing::warn;

pub async fn run(url: &str, export: Option<PathBuf>) -> anyhow::Result<()> {
    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;
    let store = UserStore::new(paths);

    let Some(identity) = store.load_current()? else {
        println!("Not logged in. Run `reviewlens login <email>` first.");
        return Ok(());
    };

    let relay = RelayClient::new(&config.relay.base_url);

    // Whitelisted pages already have a curated summary on the relay.
    match relay.lookup_summary(url).await {
        Ok(Some(summary)) => {
            println!("{}", summary);
            return Ok(());
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Summary whitelist lookup failed"),
    }

    println!("Scraping reviews for {} ...", url);
    let scraper = ScrapeClient::new(&config.scrape);
    let reviews = match scraper.fetch_reviews(url).await {
        Ok(reviews) => reviews,
        Err(e) => {
            warn!(error = %e, "Review scrape failed");
            Vec::new()
        }
    };

    if reviews.is_empty() {
        println!("No reviews found.");
        return Ok(());
    }
    println!("Fetched {} reviews.", reviews.len());

    if let Some(path) = export {
        export_reviews_csv(&reviews, &path)?;
        println!("Exported reviews to {}", path.display());
    }

    let summarizer = create_summarizer(&config.summarize);
    let summary = match summarizer.summarize(&reviews).await {
        Ok(summary) => summary,
        Err(e) => {
            warn!(error = %e, "Summary generation failed");
            println!("Failed to generate summary. Please try again.");
            return Ok(());
        }
    };

    if let Err(e) = relay
        .archive_final_review(url, identity.reviewer_version, &summary, &reviews)
        .await
    {
        warn!(error = %e, "Final-review archival failed");
    }

    println!();
    println!("{}", summary);
    Ok(())
}

fn export_reviews_csv(reviews: &[Review], path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["title", "rating", "text"])?;
    for review in reviews {
        let rating = review.rating_text();
        writer.write_record([
            review.title.as_deref().unwrap_or(""),
            rating.as_str(),
            review.body_text(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
