//! Connected session types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// State associated with one live client connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Identifier assigned by the transport at connect time.
    pub id: Uuid,
    /// When the connection was registered.
    pub connected_at: DateTime<Utc>,
    /// Peer address as reported by the transport.
    pub remote_address: String,
    /// Commands submitted over this connection.
    pub commands_issued: u64,
}

impl Session {
    pub fn new(id: Uuid, remote_address: impl Into<String>, connected_at: DateTime<Utc>) -> Self {
        Self {
            id,
            connected_at,
            remote_address: remote_address.into(),
            commands_issued: 0,
        }
    }
}
