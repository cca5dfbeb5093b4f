//! caddy-lander server.
//!
//! # Architecture Overview
//!
//! ```text
//!   admin client ──▶ http (auth, request id, trace)
//!                       │
//!          ┌────────────┴─────────────┐
//!          ▼                          ▼
//!   documents::ContentStore    promotion::ConfigPromoter
//!   (parse, backup, write)     (stage → fmt → validate → backup → rename)
//!          │                          │         │
//!          ▼                          ▼         ▼
//!    backup::BackupStore  ◀───────────┘    gate (caddy fmt / adapt)
//!
//!   hosts: live Caddyfile → landing-page links (read-only)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use caddy_lander::config::load_with_env;
use caddy_lander::http::{AppState, HttpServer};
use caddy_lander::lifecycle::{startup, Shutdown};
use caddy_lander::observability::init_tracing;

#[derive(Parser)]
#[command(name = "caddy-lander")]
#[command(about = "Admin control plane for a Caddyfile and its landing page", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "CADDY_LANDER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_with_env(args.config.as_deref())?;

    init_tracing(&config.observability);
    tracing::info!("caddy-lander v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        caddy = %config.caddy.binary.display(),
        retain = config.backups.retain,
        auth = !config.admin.password.is_empty(),
        "Configuration loaded"
    );
    if config.admin.uses_default_password() {
        tracing::warn!("Admin password is the shipped default; set ADMIN_PASSWORD");
    }

    let state = AppState::from_config(&config);
    if let Err(e) = startup::bootstrap(&state).await {
        tracing::error!(error = %e, "Bootstrap failed");
        return Err(e.into());
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = HttpServer::with_state(config, state);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
