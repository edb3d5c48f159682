// Taxi Fleet Service - Web Server

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use taxi_service::logging::{init_logging, Verbosity};
use taxi_service::web::{create_router, AppState};
use taxi_service::{Config, Database};

/// HTTP server for the taxi fleet service.
#[derive(Debug, Parser)]
#[command(name = "taxi-server", version)]
struct Args {
    /// Configuration file (TOML).
    #[arg(short, long, default_value = taxi_service::config::CONFIG_FILE_NAME)]
    config: std::path::PathBuf,

    /// Override the listen address from the configuration.
    #[arg(short, long)]
    listen: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(Verbosity::from_occurrences(args.quiet, args.verbose));

    let mut config = Config::load_from(&args.config).context("loading configuration")?;
    if let Some(listen) = args.listen {
        config.server.listen_addr = listen;
    }

    let db = Database::open(&config.database.path)
        .with_context(|| format!("opening database {}", config.database.path.display()))?;

    let listen_addr = config.server.listen_addr.clone();
    info!(
        listen = %listen_addr,
        database = %config.database.path.display(),
        page_size = config.fleet.page_size,
        manufacturer_delete = config.fleet.manufacturer_delete.as_str(),
        "starting taxi server"
    );

    let state = AppState::new(Arc::new(db), config);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("binding {listen_addr}"))?;
    info!("listening on http://{listen_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
