use reviewlens_core::{Config, Paths};
use reviewlens_session::{ClickEvent, Collector, SessionTracker, TrackerConfig, UiEvent};
use reviewlens_storage::UserStore;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tokio::sync::{broadcast, mpsc};

const HELP: &str = "\
Commands:
  click <x> <y>      record a pointer click at coordinates
  scroll             record a scroll
  url <url> [title]  navigate to a page
  show               summary element entered the viewport
  hide               summary element left the viewport
  bg                 tab hidden
  fg                 tab visible again
  help               show this help
  quit               end the session";

/// Interactive tracked session: stdin lines become UI events while the
/// debounce and heartbeat timers run live against the collector.
pub async fn run() -> anyhow::Result<()> {
    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;
    let store = UserStore::new(paths);

    let Some(identity) = store.load_current()? else {
        println!("Not logged in. Run `reviewlens login <email>` first.");
        return Ok(());
    };

    let collector = Arc::new(Collector::new(&config.relay.base_url));
    let mut tracker = SessionTracker::new(collector, TrackerConfig::from_config(&config.telemetry));
    tracker.login(identity.clone()).await;

    let (tx, rx) = mpsc::channel(64);
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let runner = tokio::spawn(tracker.run(rx, shutdown_rx));

    println!(
        "Tracked session for {} — type `help` for commands.",
        identity.email
    );

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut current_url = String::from("about:blank");
    let mut current_title = String::new();

    while let Some(line) = lines.next_line().await? {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("click") => {
                let x = parts.next().and_then(|v| v.parse().ok()).unwrap_or(0);
                let y = parts.next().and_then(|v| v.parse().ok()).unwrap_or(0);
                tx.send(UiEvent::Click(ClickEvent::at(
                    &current_url,
                    &current_title,
                    x,
                    y,
                )))
                .await?;
            }
            Some("scroll") => tx.send(UiEvent::Scroll).await?,
            Some("url") => match parts.next() {
                Some(url) => {
                    current_url = url.to_string();
                    current_title = parts.collect::<Vec<_>>().join(" ");
                    tx.send(UiEvent::PageChanged {
                        url: current_url.clone(),
                        title: current_title.clone(),
                    })
                    .await?;
                }
                None => println!("Usage: url <url> [title]"),
            },
            Some("show") => tx.send(UiEvent::SummaryShown).await?,
            Some("hide") => tx.send(UiEvent::SummaryHidden).await?,
            Some("bg") => tx.send(UiEvent::VisibilityChanged { hidden: true }).await?,
            Some("fg") => {
                tx.send(UiEvent::VisibilityChanged { hidden: false })
                    .await?
            }
            Some("help") => println!("{}", HELP),
            Some("quit") => break,
            Some(other) => println!("Unknown command `{}` — type `help`.", other),
            None => {}
        }
    }

    // Closing the event source tears the tracker down (final snapshot).
    drop(tx);
    runner.await?;
    println!("Session ended.");
    Ok(())
}
