//! HTTP server for the Prometheus metrics endpoint and membership diagnostics.
//!
//! Runs on a separate tokio task and serves:
//! - `GET /metrics` - Prometheus text format
//! - `GET /rooms` - the coordinator's room and session directories
//! - `GET /rooms/:room_id` - member addresses of one room
//! - `GET /sessions/:session_id` - rooms that confirmed a session's membership

use crate::actor::{ActorSystem, Pid};
use crate::state::{Directory, Event, room_path, session_path};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::get};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// How long a diagnostic query waits for the actor's answer.
const QUERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Handles the diagnostic routes need.
#[derive(Clone)]
pub struct AdminState {
    pub system: Arc<ActorSystem<Event>>,
    pub coordinator: Pid<Event>,
}

/// Handler for GET /metrics - returns Prometheus metrics in text format.
async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

async fn directory_handler(State(state): State<AdminState>) -> Result<Json<Directory>, StatusCode> {
    let (reply_tx, reply_rx) = oneshot::channel();
    ask(&state.coordinator, Event::GetDirectory { reply_tx }, reply_rx)
        .await
        .map(Json)
}

async fn room_handler(
    State(state): State<AdminState>,
    Path(room_id): Path<String>,
) -> Result<Json<Vec<String>>, StatusCode> {
    let path = room_path(state.coordinator.path(), &room_id).map_err(|_| StatusCode::BAD_REQUEST)?;
    let room = state.system.lookup(&path).ok_or(StatusCode::NOT_FOUND)?;

    let (reply_tx, reply_rx) = oneshot::channel();
    let members = ask(&room, Event::GetMembers { reply_tx }, reply_rx).await?;
    Ok(Json(members.iter().map(|p| p.to_string()).collect()))
}

async fn session_handler(
    State(state): State<AdminState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<String>>, StatusCode> {
    let path =
        session_path(state.coordinator.path(), &session_id).map_err(|_| StatusCode::BAD_REQUEST)?;
    let session = state.system.lookup(&path).ok_or(StatusCode::NOT_FOUND)?;

    let (reply_tx, reply_rx) = oneshot::channel();
    ask(&session, Event::GetRooms { reply_tx }, reply_rx)
        .await
        .map(Json)
}

/// Send a query and wait for its reply.
async fn ask<T>(
    to: &Pid<Event>,
    query: Event,
    reply_rx: oneshot::Receiver<T>,
) -> Result<T, StatusCode> {
    to.tell(None, query)
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;
    match tokio::time::timeout(QUERY_TIMEOUT, reply_rx).await {
        Ok(Ok(reply)) => Ok(reply),
        Ok(Err(_)) => Err(StatusCode::SERVICE_UNAVAILABLE),
        Err(_) => Err(StatusCode::GATEWAY_TIMEOUT),
    }
}

fn router(state: AdminState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/rooms", get(directory_handler))
        .route("/rooms/:room_id", get(room_handler))
        .route("/sessions/:session_id", get(session_handler))
        .with_state(state)
}

/// Run the HTTP server for Prometheus metrics and diagnostics.
///
/// Binds to `0.0.0.0:port`.
/// This is a long-running task that should be spawned in the background.
pub async fn run_http_server(port: u16, state: AdminState) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("HTTP server listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind HTTP server on {}: {}", addr, e);
            return;
        }
    };

    if let Err(e) = axum::serve(listener, router(state)).await {
        tracing::error!("HTTP server error: {}", e);
    }
}
