use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use relaygate::clock::SystemClock;
use relaygate::server::{self, AppState};
use relaygate::transport::HttpTransport;
use relaygate::{Dispatcher, GatewayConfig};

/// Relay prompts to unofficial conversational backends with daily quotas.
#[derive(Debug, Parser)]
#[command(name = "relaygate", version, about)]
struct Cli {
    /// Configuration file (defaults to ./relaygate.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to bind
    #[arg(short, long)]
    port: Option<u16>,

    /// Region label reported by /ping
    #[arg(long)]
    region: Option<String>,

    /// Print the effective configuration (secrets redacted) and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = GatewayConfig::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(region) = cli.region {
        config.region = region;
    }

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config.redacted())?);
        return Ok(());
    }

    if config.gemini_cookie.is_none() {
        warn!("GEMINI_COOKIE is not set; Gemini session bootstrap will likely fail");
    }
    info!(
        region = %config.region,
        gemini_limit = config.quota.limit_for(relaygate::Backend::Gemini),
        perplexity_limit = config.quota.limit_for(relaygate::Backend::Perplexity),
        "Starting relaygate"
    );

    let transport = Arc::new(HttpTransport::new()?);
    let dispatcher = Arc::new(Dispatcher::from_config(
        &config,
        transport,
        Arc::new(SystemClock),
    ));

    server::serve(&config.bind_addr(), AppState::new(dispatcher, config.region.clone())).await?;
    Ok(())
}
