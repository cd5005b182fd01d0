//! PAE Quest daemon - serves the game API to the browser UI.

use anyhow::Result;
use clap::Parser;
use pae_common::GameConfig;
use paed::server::{self, AppState};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "paed")]
#[command(about = "PAE Quest game server", long_about = None)]
#[command(version = pae_common::VERSION)]
struct Args {
    /// Config file (default: $PAE_CONFIG, then the user and system config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bind address, overrides [server] bind
    #[arg(long)]
    bind: Option<String>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    info!("[BOOT] PAE Quest daemon v{} starting...", pae_common::VERSION);

    let mut config = GameConfig::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    let state = AppState::from_config(config)?;
    info!(
        "[BOOT] {} proteins, {} achievements",
        state.proteins.len(),
        state.engine.catalog().len()
    );

    server::run(state).await
}
