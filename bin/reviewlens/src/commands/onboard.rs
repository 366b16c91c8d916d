use reviewlens_core::{Config, Paths};

pub async fn run(force: bool) -> anyhow::Result<()> {
    let paths = Paths::new();
    let config_path = paths.config_file();

    if config_path.exists() && !force {
        println!("Config already exists at {}", config_path.display());
        println!("Use --force to overwrite.");
        return Ok(());
    }

    paths.ensure_dirs()?;
    let config = Config::default();
    config.save(&config_path)?;

    println!("✅ reviewlens initialized");
    println!();
    println!("Config:  {}", config_path.display());
    println!("Roster:  {}", paths.roster_file().display());
    println!("Tables:  {}", paths.tables_dir().display());
    println!();
    println!("Next steps:");
    println!("  1. Add your scrape token (config.json → scrape.token)");
    println!("  2. Add your summarizer key (config.json → summarize.apiKey)");
    println!("  3. Start the relay:        reviewlens relay");
    println!("  4. Register a reviewer:    reviewlens register you@example.com");
    Ok(())
}
