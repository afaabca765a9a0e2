//! Per-connection outbound channels.
//!
//! The engine hands typed deliveries to the hub; each WebSocket connection
//! drains its own channel and owns the wire encoding.

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;
use valon_core::{Delivery, Outbound, ValonError};
use valon_types::WsServerMessage;

/// Queue depth per connection before deliveries are dropped.
const OUTBOUND_BUFFER: usize = 256;

#[derive(Default)]
pub struct ConnectionHub {
    channels: DashMap<Uuid, mpsc::Sender<WsServerMessage>>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a channel for a connection. Replaces any previous one for the id.
    pub fn attach(&self, session_id: Uuid) -> mpsc::Receiver<WsServerMessage> {
        let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);
        self.channels.insert(session_id, tx);
        rx
    }

    pub fn detach(&self, session_id: Uuid) {
        self.channels.remove(&session_id);
    }

    pub fn connection_count(&self) -> usize {
        self.channels.len()
    }

    /// Queue a message for one connection without waiting.
    pub fn send(&self, session_id: Uuid, message: WsServerMessage) -> valon_core::Result<()> {
        let tx = self
            .channels
            .get(&session_id)
            .ok_or(ValonError::SessionNotFound(session_id))?;
        tx.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                debug!(target: "valon::ws", "Outbound queue full for session {}", session_id);
                ValonError::ChannelFull(session_id)
            }
            mpsc::error::TrySendError::Closed(_) => ValonError::ChannelClosed(session_id),
        })
    }
}

impl Outbound for ConnectionHub {
    fn deliver(&self, session_id: Uuid, delivery: Delivery) -> valon_core::Result<()> {
        self.send(session_id, to_message(delivery))
    }
}

/// Wire form of an engine delivery.
pub fn to_message(delivery: Delivery) -> WsServerMessage {
    match delivery {
        Delivery::Status(snapshot) => WsServerMessage::StatusUpdate(snapshot),
        Delivery::CommandResult(receipt) => WsServerMessage::CommandResult {
            success: receipt.outcome.success,
            command: receipt.command,
            result: receipt.outcome.result,
            result_type: receipt.outcome.kind,
            task_id: receipt.task_id,
        },
    }
}
