//! # rollcall-server
//!
//! HTTP server for the rollcall attendance verification system.
//!
//! ## Running
//!
//! ```bash
//! # Development, with the default configuration path
//! cargo run --package rollcall-server
//!
//! # Explicit configuration file
//! ROLLCALL_CONFIG=./rollcall.toml ./rollcall-server
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use std::path::PathBuf;

use anyhow::Context;
use rollcall_core::default_config_path;
use rollcall_server::api::create_router;
use rollcall_server::logging;
use rollcall_server::state::AppState;
use tokio::net::TcpListener;
use tracing::info;

/// Environment variable overriding the configuration file path.
const CONFIG_PATH_ENV: &str = "ROLLCALL_CONFIG";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::var_os(CONFIG_PATH_ENV)
        .map_or_else(default_config_path, PathBuf::from);

    let state = AppState::load(&config_path)
        .with_context(|| format!("loading configuration from {}", config_path.display()))?;

    logging::init(state.config.server.production)?;

    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    info!(
        config = %config_path.display(),
        schedules = state.schedules.len(),
        radius_m = state.policy.geofence_radius_meters(),
        timezone = state.config.attendance.timezone.name(),
        "Starting rollcall-server"
    );

    let app = create_router(state.shared());
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
