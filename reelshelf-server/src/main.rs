//! # Reelshelf Server
//!
//! Serves a flat-directory video library over HTTP.
//!
//! ## Overview
//!
//! - **Uploads**: batch video upload with an immediate slate thumbnail
//! - **Thumbnails**: custom cover, extracted frame or generated slate, resolved on every listing
//! - **Editing**: rename, delete and slate regeneration with a chosen theme
//!
//! ## Architecture
//!
//! The server is built on Axum and uses:
//! - a JSON sidecar file for titles
//! - FFmpeg, when available, for representative frames

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelshelf_server::{
    infra::{
        config::{Config, ConfigLoad, ConfigLoader},
        startup::wire_app_state,
    },
    routes,
};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "reelshelf-server")]
#[command(about = "Video library server with automatic thumbnails")]
struct Cli {
    /// Path to a reelshelf.toml configuration file
    #[arg(short, long, env = "REELSHELF_CONFIG")]
    config: Option<PathBuf>,

    /// Server port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Directory holding the videos (overrides config)
    #[arg(long)]
    library_root: Option<PathBuf>,

    /// Environment file to load instead of ./.env
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_runtime_config(&cli)?;
    run_server(config).await
}

fn load_runtime_config(cli: &Cli) -> anyhow::Result<Arc<Config>> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_config_path(path);
    }
    if let Some(path) = &cli.env_file {
        loader = loader.with_env_file(path);
    }
    let ConfigLoad {
        mut config,
        warnings,
    } = loader.load().context("failed to load configuration")?;

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(host) = cli.host.clone() {
        config.server.host = host;
    }
    if let Some(root) = cli.library_root.clone() {
        config.library.root = root;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "configuration file loaded");
    }

    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => {
                warn!(message = %warning.message, "configuration warning")
            }
        }
    }

    Ok(Arc::new(config))
}

async fn run_server(config: Arc<Config>) -> anyhow::Result<()> {
    let state = wire_app_state(Arc::clone(&config)).await?;
    let router = routes::create_app(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    info!(
        "Starting Reelshelf server on {}:{}",
        config.server.host, config.server.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, router).await?;

    Ok(())
}
