use axum::{
    extract::{
        ws::{WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};

use crate::state::AppState;
use crate::ws::actor;

/// GET /ws
/// WebSocket upgrade endpoint. A connection is admitted to the registry only
/// once the handshake completes and the actor starts; a failed upgrade
/// changes no state.
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_upgraded(socket, state))
}

async fn handle_upgraded(socket: WebSocket, state: AppState) {
    actor::run_connection(socket, state).await;
}
