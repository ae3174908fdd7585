//! Web server binary for scout.

use clap::Parser;
use scout::server::{AppState, ScoutServer};
use scout::ScoutConfig;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Scout: keyword-combination news search with LLM-assisted analysis.
#[derive(Parser)]
#[command(name = "scout", version, about)]
struct Cli {
    /// Path to TOML configuration file (defaults to ~/.config/scout/config.toml if present).
    #[arg(short, long, env = "SCOUT_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address override.
    #[arg(long)]
    host: Option<String>,

    /// Bind port override (0 = auto-assign).
    #[arg(short, long)]
    port: Option<u16>,

    /// Serve fixed sample results instead of scraping.
    #[arg(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("scout=info,scout_search=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let state = AppState::from_config(&config)?;
    let server = ScoutServer::start(state, &config.server).await?;

    println!("Scout v{} on http://{}", env!("CARGO_PKG_VERSION"), server.addr());
    if config.demo {
        info!("demo mode enabled; live searches are disabled");
    }

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    server.shutdown();
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<ScoutConfig> {
    let mut config = match &cli.config {
        Some(path) => ScoutConfig::from_file(path)?,
        None => {
            let path = ScoutConfig::default_config_path();
            if path.is_file() {
                info!(path = %path.display(), "loading config");
                ScoutConfig::from_file(&path)?
            } else {
                ScoutConfig::default()
            }
        }
    };

    config.apply_env();
    if let Some(host) = &cli.host {
        config.server.host.clone_from(host);
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.demo {
        config.demo = true;
    }

    config.validate()?;
    Ok(config)
}
