use axum::{http::StatusCode, Router};

use crate::state::AppState;
use crate::ws::handler as ws_handler;

/// GET /api/host-ip — Plain-text non-loopback IPv4 address of the host.
/// A LAN discovery convenience so client devices on the same network can
/// find the server without configuration.
async fn host_ip() -> Result<String, StatusCode> {
    match local_ip_address::local_ip() {
        Ok(ip) => Ok(ip.to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "failed to determine local IP");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// Build the full axum Router with all routes.
pub fn build_router(state: AppState) -> Router {
    // WebSocket endpoint: the persistent bidirectional channel per participant
    let ws_routes = Router::new().route("/ws", axum::routing::get(ws_handler::ws_upgrade));

    // LAN discovery
    let discovery_routes = Router::new().route("/api/host-ip", axum::routing::get(host_ip));

    // Health check
    let health = Router::new().route("/health", axum::routing::get(health_check));

    Router::new()
        .merge(ws_routes)
        .merge(discovery_routes)
        .merge(health)
        .with_state(state)
}

/// Basic health check endpoint
async fn health_check() -> &'static str {
    "ok"
}
