//! Task records: one per submitted command.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::Outcome;

/// Lifecycle of a task. Starts pending and transitions exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Terminal status for a routed command.
    pub fn from_success(success: bool) -> Self {
        if success {
            TaskStatus::Completed
        } else {
            TaskStatus::Failed
        }
    }
}

/// Who submitted a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Submitter {
    /// A connected session.
    Session(Uuid),
    /// The polling API or any caller without a session.
    Anonymous,
}

impl Submitter {
    pub fn session_id(&self) -> Option<Uuid> {
        match self {
            Submitter::Session(id) => Some(*id),
            Submitter::Anonymous => None,
        }
    }
}

impl fmt::Display for Submitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Submitter::Session(id) => write!(f, "{}", id),
            Submitter::Anonymous => f.write_str("anonymous"),
        }
    }
}

/// A point-in-time view of one submitted command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub command: String,
    pub user: Submitter,
    pub submitted_at: DateTime<Utc>,
    pub status: TaskStatus,
    /// Set together with the terminal status.
    pub result: Option<Outcome>,
}
