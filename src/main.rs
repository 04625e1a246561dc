use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use testgen_relay::{config::Config, http::start_http_server};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "testgen-relay")]
#[command(about = "Relay test requirements to a text-generation service", long_about = None)]
struct Cli {
    /// Path to the TOML config file (defaults to $RELAY_CONFIG or testgen_relay.toml)
    #[arg(long)]
    config: Option<String>,

    /// Address to listen on, overrides config and RELAY_HTTP_BIND
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Generation endpoint URL, overrides config and RELAY_GENERATE_URL
    #[arg(long)]
    generate_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config.as_deref() {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(url) = cli.generate_url {
        config.generation.url = url;
        config.validate()?;
    }

    tracing_subscriber::fmt()
        .with_env_filter(config.server.log_level.as_str())
        .with_ansi(false)
        .init();

    match &config.source {
        Some(path) => info!("Config file {} loaded", path.display()),
        None => warn!("Config file not found, using defaults"),
    }
    info!(
        "Configuration loaded: generation={} timeout={}s",
        config.generation.url, config.generation.timeout_secs
    );

    start_http_server(config).await?;

    Ok(())
}
