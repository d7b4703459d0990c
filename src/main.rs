//! slroomd - Straylight Room Daemon
//!
//! Room membership coordination over WebSocket, built on a small actor
//! runtime: one coordinator, one registry actor per room, one proxy actor per
//! connected session.

mod actor;
mod config;
mod error;
mod http;
mod metrics;
mod network;
mod state;
mod telemetry;

use crate::actor::ActorSystem;
use crate::config::Config;
use crate::network::Gateway;
use crate::state::{COORDINATOR_NAME, Coordinator, sessions_root};
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            // Logging is not up yet; the format comes from the config.
            eprintln!("failed to load config {config_path}: {e}");
            return Err(e.into());
        }
    };

    telemetry::init(config.server.log_format);

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "configuration has {} error(s), see above",
            errors.len()
        ));
    }

    info!(
        server = %config.server.name,
        listen = %config.listen.address,
        path = %config.websocket.path,
        "Starting slroomd"
    );

    let system = ActorSystem::new(config.server.name.clone());
    let coordinator = system
        .spawn(
            COORDINATOR_NAME,
            Coordinator::new(config.rooms.startup_rooms()),
        )
        .await?;

    // Prometheus metrics are optional.
    // Convention: metrics_port = 0 disables the HTTP endpoint (used by tests).
    let metrics_port = config.server.metrics_port;
    if metrics_port == 0 {
        info!("Metrics disabled");
    } else {
        metrics::init();
        info!("Metrics initialized");

        let admin = http::AdminState {
            system: Arc::clone(&system),
            coordinator: coordinator.clone(),
        };
        tokio::spawn(async move {
            http::run_http_server(metrics_port, admin).await;
        });
        info!(port = metrics_port, "Prometheus HTTP server started");
    }

    let coordinator_path = coordinator.path().clone();
    let gateway = Gateway::bind(config.listen.address, config.websocket, coordinator).await?;
    info!(address = %gateway.local_addr()?, "Ready");

    let result = tokio::select! {
        result = gateway.run() => result,
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => info!("Shutdown requested"),
                Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
            }
            Ok(())
        }
    };

    // Sessions leave their rooms before any room stops.
    info!(actors = system.len(), "Stopping actors");
    match sessions_root(&coordinator_path) {
        Ok(sessions) => system.stop_subtree(&sessions).await,
        Err(e) => warn!(error = %e, "Failed to resolve session subtree"),
    }
    system.shutdown().await;
    if !system.is_empty() {
        warn!(actors = system.len(), "Actors still registered after shutdown");
    }
    info!(system = %system.name(), "Stopped");

    result
}
