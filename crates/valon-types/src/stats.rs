//! Aggregate status views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time counters pushed to every connected session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub status: String,
    pub uptime: String,
    pub commands_executed: u64,
    pub user_count: usize,
    pub session_count: usize,
    pub task_count: usize,
    pub version: String,
}

/// Polling view of the agent, served over plain HTTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateStats {
    pub status: String,
    pub agent_status: String,
    pub uptime: String,
    pub started_at: DateTime<Utc>,
    pub commands_executed: u64,
    pub active_users: usize,
    pub active_sessions: usize,
    pub total_tasks: usize,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}
