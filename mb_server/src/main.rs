//! Multi-bot control panel server.
//!
//! Serves the browser panel and drives every bot through one panel actor.

use std::net::SocketAddr;

use anyhow::Error;
use log::{error, info};
use mb_server::{
    api,
    config::{AdapterKind, PanelConfig},
    logging, metrics, start_panel,
};
use pico_args::Arguments;

const HELP: &str = "\
Run the multi-bot control panel

USAGE:
  mb_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     HTTP bind address        [default: env SERVER_BIND or 127.0.0.1:3000]
  --adapter    KIND        Bot adapter, tcp|loopback [default: env BOT_ADAPTER or tcp]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              HTTP bind address (e.g., 0.0.0.0:8080)
  PORT                     Port to bind on all interfaces when SERVER_BIND is unset
  JWT_SECRET               Session token signing secret (required)
  PASSWORD_PEPPER          Password hashing pepper (required)
  ADMIN_USERNAME           Seeded admin account [default: admin]
  ADMIN_PASSWORD           Seeded admin password (required)
  DEFAULT_SERVER_HOST      Game server seeded as #1 [default: localhost]
  METRICS_BIND             Prometheus exporter address (optional)
  (See .env.example for all configuration options)
";

struct Args {
    bind: Option<SocketAddr>,
    adapter: Option<AdapterKind>,
}

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

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        adapter: pargs.opt_value_from_str("--adapter")?,
    };

    logging::init();

    let config = PanelConfig::from_env(args.bind, args.adapter)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(Error::msg)?;
        info!("Prometheus metrics at http://{}/metrics", addr);
    }

    let state = start_panel(&config)
        .map_err(|e| anyhow::anyhow!("Failed to seed admin account: {}", e))?;
    let panel = state.panel.clone();

    let app = api::create_router(state);

    info!("Starting HTTP/WebSocket server on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Web control panel running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");
    match panel.shutdown().await {
        Ok(closed) => info!("Closed {} bot connection(s)", closed),
        Err(e) => error!("Panel shutdown failed: {}", e),
    }

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}
