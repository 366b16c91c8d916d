use reviewlens_core::{Config, Paths};
use reviewlens_relay::RelayClient;
use reviewlens_session::{AuthManager, Collector, SessionContext, SnapshotSink};
use reviewlens_storage::UserStore;
use std::io::{self, Write};
use tracing::warn;

pub async fn register(email: &str) -> anyhow::Result<()> {
    let paths = Paths::new();
    paths.ensure_dirs()?;
    let config = Config::load_or_default(&paths)?;
    let auth = AuthManager::new(UserStore::new(paths));

    let pending = match auth.begin_registration(email) {
        Ok(pending) => pending,
        Err(e) => {
            println!("{}", e);
            return Ok(());
        }
    };

    println!(
        "OTP sent to {}. For demo purposes, your OTP is: {}",
        pending.email(),
        pending.otp()
    );
    print!("Enter OTP: ");
    io::stdout().flush()?;
    let mut submitted = String::new();
    io::stdin().read_line(&mut submitted)?;

    let identity = match auth.complete_registration(&pending, submitted.trim()) {
        Ok(identity) => identity,
        Err(e) => {
            println!("{}", e);
            return Ok(());
        }
    };

    // Best-effort announcements; local registration already succeeded.
    let relay = RelayClient::new(&config.relay.base_url);
    if let Err(e) = relay.register(&identity).await {
        warn!(error = %e, "Registration announcement failed");
    }
    send_snapshot(&config, &identity, "login").await;

    println!(
        "Registered and logged in as: {} | Reviewer Version: {}",
        identity.email, identity.reviewer_version
    );
    Ok(())
}

pub async fn login(email: &str) -> anyhow::Result<()> {
    let paths = Paths::new();
    paths.ensure_dirs()?;
    let config = Config::load_or_default(&paths)?;
    let auth = AuthManager::new(UserStore::new(paths));

    let identity = match auth.login(email) {
        Ok(identity) => identity,
        Err(e) => {
            println!("{}", e);
            return Ok(());
        }
    };

    send_snapshot(&config, &identity, "login").await;
    println!(
        "Logged in as: {} | Reviewer Version: {}",
        identity.email, identity.reviewer_version
    );
    Ok(())
}

pub async fn logout() -> anyhow::Result<()> {
    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;
    let store = UserStore::new(paths);

    match store.load_current()? {
        Some(identity) => {
            // The logout snapshot goes out before local state is cleared.
            send_snapshot(&config, &identity, "logout").await;
            store.save_current(None)?;
            println!("Logged out {}.", identity.email);
        }
        None => println!("Not logged in."),
    }
    Ok(())
}

async fn send_snapshot(config: &Config, identity: &reviewlens_core::Identity, action: &str) {
    let collector = Collector::new(&config.relay.base_url);
    let context = SessionContext::new(identity.clone());
    if let Err(e) = collector
        .deliver(context.snapshot(action, serde_json::Map::new()))
        .await
    {
        warn!(error = %e, action, "Snapshot delivery failed");
    }
}
