//! WebSocket connection handling.

use crate::state::AppState;
use anyhow::Result;
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use valon_types::{Submitter, WsClientMessage, WsServerMessage};

/// Maximum size for a single inbound text frame (10KB)
const MAX_INPUT_SIZE: usize = 10 * 1024;

pub async fn handle_websocket(socket: WebSocket, state: Arc<AppState>, remote: SocketAddr) -> Result<()> {
    let session_id = Uuid::new_v4();
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Attach before registering so the connect broadcast reaches this client too
    let mut outgoing_rx = state.hub.attach(session_id);

    if let Err(e) = state.engine.on_connect(session_id, &remote.to_string()) {
        state.hub.detach(session_id);
        warn!(target: "valon::ws", "Rejected connection from {}: {}", remote, e);
        let msg = WsServerMessage::Error {
            code: "connect_rejected".to_string(),
            message: e.to_string(),
        };
        ws_tx.send(Message::Text(serde_json::to_string(&msg)?.into())).await?;
        return Ok(());
    }

    info!(
        target: "valon::ws",
        "Session {} connected from {} ({} open connections)",
        session_id, remote, state.hub.connection_count()
    );

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = outgoing_rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(j) => j,
                Err(e) => {
                    warn!(target: "valon::ws", "Failed to encode message for session {}: {}", session_id, e);
                    continue;
                }
            };
            if let Err(e) = ws_tx.send(Message::Text(json.into())).await {
                debug!(target: "valon::ws", "WebSocket send failed for session {}: {}", session_id, e);
                break;
            }
        }
    });

    let recv_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_rx.next().await {
            match msg {
                Message::Text(text) => handle_client_message(&recv_state, session_id, text.as_str()),
                Message::Ping(_) => {
                    // Pong is handled automatically by axum
                    tracing::trace!(target: "valon::ws::ping", "Received ping from session {}", session_id);
                }
                Message::Close(_) => {
                    debug!(target: "valon::ws", "Session {} closed connection", session_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    // Detach first so the disconnect broadcast skips the closed socket
    state.hub.detach(session_id);
    state.engine.on_disconnect(session_id);
    info!(
        target: "valon::ws",
        "Session {} disconnected ({} open connections)",
        session_id, state.hub.connection_count()
    );
    Ok(())
}

/// Dispatch one inbound frame. Commands run as their own task so a slow
/// fetch never blocks this connection's other messages.
fn handle_client_message(state: &Arc<AppState>, session_id: Uuid, text: &str) {
    if text.len() > MAX_INPUT_SIZE {
        reply(state, session_id, WsServerMessage::Error {
            code: "message_too_large".to_string(),
            message: format!("Message exceeds {} bytes", MAX_INPUT_SIZE),
        });
        return;
    }

    match serde_json::from_str::<WsClientMessage>(text) {
        Ok(WsClientMessage::ExecuteCommand { command }) => {
            let state = state.clone();
            tokio::spawn(async move {
                state
                    .engine
                    .submit_command(Submitter::Session(session_id), &command)
                    .await;
            });
        }
        Ok(WsClientMessage::GetStatus) => {
            if let Err(e) = state.engine.send_status(session_id) {
                debug!(target: "valon::ws", "Status not sent to session {}: {}", session_id, e);
            }
        }
        Ok(WsClientMessage::Ping { timestamp }) => {
            reply(state, session_id, WsServerMessage::Pong { timestamp });
        }
        Err(e) => {
            debug!(target: "valon::ws", "Invalid message from session {}: {}", session_id, e);
            reply(state, session_id, WsServerMessage::Error {
                code: "invalid_message".to_string(),
                message: e.to_string(),
            });
        }
    }
}

fn reply(state: &AppState, session_id: Uuid, message: WsServerMessage) {
    if let Err(e) = state.hub.send(session_id, message) {
        debug!(target: "valon::ws", "Reply to session {} dropped: {}", session_id, e);
    }
}
