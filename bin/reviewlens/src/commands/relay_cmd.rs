use reviewlens_core::{Config, Paths};

pub async fn run(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;

    let host = host.unwrap_or_else(|| config.relay.host.clone());
    let port = port.unwrap_or(config.relay.port);

    reviewlens_relay::serve(paths, &host, port).await?;
    Ok(())
}
