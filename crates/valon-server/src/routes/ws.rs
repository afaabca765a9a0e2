//! WebSocket route handler.

use crate::state::AppState;
use crate::websocket::handle_websocket;
use axum::{
    extract::{
        ConnectInfo, State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;

pub async fn upgrade(
    State(state): State<Arc<AppState>>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_connection(socket, state, remote))
}

async fn handle_connection(socket: WebSocket, state: Arc<AppState>, remote: SocketAddr) {
    if let Err(e) = handle_websocket(socket, state, remote).await {
        tracing::error!(target: "valon::ws", "WebSocket error for {}: {}", remote, e);
    }
}
