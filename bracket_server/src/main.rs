//! Tournament bracket server using async actor model.
//!
//! Each generated bracket runs in its own BracketActor, addressed through the
//! BracketManager held in the HTTP state.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use bracket_engine::bracket::BracketManager;
use bracket_server::{api, config::ServerConfig, logging, metrics};
use pico_args::Arguments;
use tracing::info;

const HELP: &str = "\
Run the tournament bracket server

USAGE:
  bracket_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env BRACKET_SERVER_BIND or 127.0.0.1:6969]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  BRACKET_SERVER_BIND          Server bind address (e.g., 0.0.0.0:8080)
  BRACKET_METRICS_BIND         Prometheus exporter address (disabled when unset)
  BRACKET_MAX_PARTICIPANTS     Participants allowed per bracket [default: 1024]
  BRACKET_MAX_SWISS_ROUNDS     Swiss rounds allowed per bracket [default: 64]
  BRACKET_ACTOR_INBOX          Message capacity of each bracket actor [default: 100]
  RUST_LOG                     Log filter (e.g., info,bracket_engine=debug)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind: Option<SocketAddr> = pargs
        .opt_value_from_str("--bind")
        .context("Invalid --bind address")?;

    logging::init();

    let config = ServerConfig::from_env(bind)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        info!("Prometheus metrics exposed at http://{}/metrics", addr);
    }

    info!(
        "Limits: {} participants, {} Swiss rounds; actor inbox {}",
        config.limits.max_participants, config.limits.max_swiss_rounds, config.actor_inbox
    );

    let manager = Arc::new(BracketManager::new(config.limits, config.actor_inbox));
    let app = api::create_router(api::AppState { manager });

    info!("Starting HTTP server on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
