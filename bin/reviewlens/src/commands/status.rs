use reviewlens_core::{Config, Paths};
use reviewlens_storage::UserStore;

pub async fn run() -> anyhow::Result<()> {
    let paths = Paths::new();

    println!("reviewlens status");
    println!("=================");
    println!();

    let config_path = paths.config_file();
    let config_exists = config_path.exists();
    println!(
        "Config:   {} {}",
        config_path.display(),
        if config_exists { "✓" } else { "✗ (not found)" }
    );

    if !config_exists {
        println!();
        println!("Run `reviewlens onboard` to initialize.");
        return Ok(());
    }

    let config = Config::load(&config_path)?;
    println!("Relay:    {}", config.relay.base_url);
    println!(
        "Summary:  {} backend, model {}, key {}",
        config.summarize.backend,
        config.summarize.model,
        if config.summarize.api_key.is_empty() {
            "✗ missing"
        } else {
            "✓ configured"
        }
    );
    println!(
        "Scraper:  {} ({}), token {}",
        config.scrape.actor,
        config.scrape.api_base,
        if config.scrape.token.is_empty() {
            "✗ missing"
        } else {
            "✓ configured"
        }
    );
    println!(
        "Compare:  up to {} entities",
        config.compare.selection_capacity
    );

    println!();
    let store = UserStore::new(paths);
    println!("Reviewers registered: {}", store.count()?);
    match store.load_current()? {
        Some(identity) => println!(
            "Logged in as: {} | Reviewer Version: {}",
            identity.email, identity.reviewer_version
        ),
        None => println!("Not logged in."),
    }

    Ok(())
}
