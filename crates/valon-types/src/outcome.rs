//! Command outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which handler produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    System,
    Web,
    Calculation,
    Status,
    Help,
    General,
    Error,
}

/// Aggregate counters returned by `system:memory`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryReport {
    pub commands_executed: u64,
    pub uptime: String,
    pub active_users: usize,
    pub active_sessions: usize,
    pub total_tasks: usize,
    pub system_info: String,
}

/// Connected sessions returned by `system:users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersReport {
    pub total_users: usize,
    pub active_sessions: usize,
    pub user_list: Vec<Uuid>,
}

/// Agent status returned by `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: String,
    pub uptime: String,
    pub commands_executed: u64,
    pub active_users: usize,
    pub total_tasks: usize,
    pub version: String,
}

/// Payload of an outcome: plain text or a structured record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutcomeBody {
    Text(String),
    Memory(MemoryReport),
    Users(UsersReport),
    Status(StatusReport),
}

impl OutcomeBody {
    /// Text payload, if this is one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            OutcomeBody::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<String> for OutcomeBody {
    fn from(text: String) -> Self {
        OutcomeBody::Text(text)
    }
}

impl From<&str> for OutcomeBody {
    fn from(text: &str) -> Self {
        OutcomeBody::Text(text.to_string())
    }
}

/// Structured result of routing one command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub success: bool,
    pub result: OutcomeBody,
    #[serde(rename = "type")]
    pub kind: OutcomeKind,
    pub timestamp: DateTime<Utc>,
}

impl Outcome {
    pub fn success(kind: OutcomeKind, result: impl Into<OutcomeBody>) -> Self {
        Self {
            success: true,
            result: result.into(),
            kind,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(kind: OutcomeKind, result: impl Into<OutcomeBody>) -> Self {
        Self {
            success: false,
            result: result.into(),
            kind,
            timestamp: Utc::now(),
        }
    }
}

/// What a submitter gets back for one command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandReceipt {
    /// Absent when the command was rejected before a task was created.
    pub task_id: Option<u64>,
    pub command: String,
    pub outcome: Outcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serializes_kind_as_type() {
        let outcome = Outcome::success(OutcomeKind::Help, "help text");
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["type"], "help");
        assert_eq!(value["success"], true);
        assert_eq!(value["result"], "help text");
    }

    #[test]
    fn test_structured_body_serializes_as_record() {
        let outcome = Outcome::success(
            OutcomeKind::System,
            OutcomeBody::Users(UsersReport {
                total_users: 1,
                active_sessions: 1,
                user_list: vec![Uuid::nil()],
            }),
        );
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["result"]["total_users"], 1);
        assert_eq!(value["result"]["user_list"][0], Uuid::nil().to_string());
    }

    #[test]
    fn test_as_text() {
        assert_eq!(OutcomeBody::from("ok").as_text(), Some("ok"));
        let record = OutcomeBody::Users(UsersReport {
            total_users: 0,
            active_sessions: 0,
            user_list: vec![],
        });
        assert_eq!(record.as_text(), None);
    }
}
