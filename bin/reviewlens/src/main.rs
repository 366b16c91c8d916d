mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "reviewlens")]
#[command(about = "Travel-review companion: reviewer identities, session telemetry, review scraping, summaries, and amenity comparison", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and local data directories
    Onboard {
        /// Force overwrite existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Show configuration and login state
    Status,

    /// Register a new reviewer (email + OTP verification)
    Register {
        /// Email address to register
        email: String,
    },

    /// Log in as a registered reviewer
    Login {
        /// Registered email address
        email: String,
    },

    /// Log out and clear the active session
    Logout,

    /// Manage the local reviewer roster
    Users {
        #[command(subcommand)]
        command: UsersCommands,
    },

    /// Run an interactive tracked session
    Session,

    /// Scrape reviews for a page, summarize them, and archive the result
    Summarize {
        /// Page URL to summarize
        url: String,

        /// Also export the scraped reviews as CSV to this path
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Compare amenities across entity pages (2 or 3)
    Compare {
        /// Entity pages, each as URL or NAME=URL
        entries: Vec<String>,
    },

    /// Start the relay server
    Relay {
        /// Host to bind to (overrides config relay.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config relay.port)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Subcommand)]
enum UsersCommands {
    /// List registered reviewers
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Onboard { force } => {
            commands::onboard::run(force).await?;
        }
        Commands::Status => {
            commands::status::run().await?;
        }
        Commands::Register { email } => {
            commands::auth_cmd::register(&email).await?;
        }
        Commands::Login { email } => {
            commands::auth_cmd::login(&email).await?;
        }
        Commands::Logout => {
            commands::auth_cmd::logout().await?;
        }
        Commands::Users { command } => match command {
            UsersCommands::List => {
                commands::users::list().await?;
            }
        },
        Commands::Session => {
            commands::session_cmd::run().await?;
        }
        Commands::Summarize { url, export } => {
            commands::summarize_cmd::run(&url, export).await?;
        }
        Commands::Compare { entries } => {
            commands::compare_cmd::run(&entries).await?;
        }
        Commands::Relay { host, port } => {
            commands::relay_cmd::run(host, port).await?;
        }
    }

    Ok(())
}
