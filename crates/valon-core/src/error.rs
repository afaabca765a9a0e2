//! Error types for Valon.

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ValonError {
    #[error("Session already registered: {0}")]
    SessionAlreadyExists(Uuid),

    #[error("Session limit exceeded: max {0} concurrent sessions")]
    SessionLimitExceeded(usize),

    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Task {0} already has an outcome")]
    TaskAlreadyCompleted(u64),

    #[error("Outbound channel closed for session {0}")]
    ChannelClosed(Uuid),

    #[error("Outbound channel full for session {0}")]
    ChannelFull(Uuid),

    #[error("Fetch failed: {0}")]
    Fetch(String),
}
