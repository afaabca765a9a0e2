//! WebSocket message protocol between client and server.

use serde::{Deserialize, Serialize};

use crate::{OutcomeBody, OutcomeKind, StatusSnapshot};

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsClientMessage {
    /// Submit a command for routing.
    ExecuteCommand {
        #[serde(default)]
        command: String,
    },
    /// Ask for a fresh status snapshot.
    GetStatus,
    /// Keepalive.
    Ping { timestamp: u64 },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsServerMessage {
    /// Aggregate counters, pushed after every connect, disconnect and command.
    StatusUpdate(StatusSnapshot),
    /// Result of a command submitted by this connection.
    CommandResult {
        success: bool,
        command: String,
        result: OutcomeBody,
        result_type: OutcomeKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        task_id: Option<u64>,
    },
    /// Keepalive reply.
    Pong { timestamp: u64 },
    /// Protocol-level error.
    Error { code: String, message: String },
}

#[cfg(test)]
mod serialization_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_update_serialization() {
        let msg = WsServerMessage::StatusUpdate(StatusSnapshot {
            status: "Active".to_string(),
            uptime: "0:00:05".to_string(),
            commands_executed: 3,
            user_count: 2,
            session_count: 2,
            task_count: 3,
            version: "2.1.0".to_string(),
        });
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"status_update""#));
        assert!(json.contains(r#""user_count":2"#));
        assert!(json.contains(r#""task_count":3"#));
    }

    #[test]
    fn test_command_result_text_serialization() {
        let msg = WsServerMessage::CommandResult {
            success: true,
            command: "calculate:2+2".to_string(),
            result: OutcomeBody::Text("2+2 = 4".to_string()),
            result_type: OutcomeKind::Calculation,
            task_id: Some(7),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "command_result");
        assert_eq!(value["result"], "2+2 = 4");
        assert_eq!(value["result_type"], "calculation");
        assert_eq!(value["task_id"], 7);
    }

    #[test]
    fn test_command_result_without_task_omits_id() {
        let msg = WsServerMessage::CommandResult {
            success: false,
            command: String::new(),
            result: OutcomeBody::Text("No command provided".to_string()),
            result_type: OutcomeKind::Error,
            task_id: None,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("task_id"));
    }

    #[test]
    fn test_client_message_parsing() {
        let msg: WsClientMessage =
            serde_json::from_value(json!({"type": "execute_command", "command": "help"})).unwrap();
        assert!(matches!(msg, WsClientMessage::ExecuteCommand { ref command } if command == "help"));

        let msg: WsClientMessage = serde_json::from_value(json!({"type": "get_status"})).unwrap();
        assert!(matches!(msg, WsClientMessage::GetStatus));

        // Missing command text is accepted and rejected later as a validation failure
        let msg: WsClientMessage =
            serde_json::from_value(json!({"type": "execute_command"})).unwrap();
        assert!(matches!(msg, WsClientMessage::ExecuteCommand { ref command } if command.is_empty()));
    }

    #[test]
    fn test_unknown_client_message_rejected() {
        let result = serde_json::from_value::<WsClientMessage>(json!({"type": "shutdown"}));
        assert!(result.is_err());
    }
}
