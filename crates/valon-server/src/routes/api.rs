//! Polling API: status, recent tasks, one-shot command execution.

use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use valon_types::{AggregateStats, Outcome, Session, Submitter, Task};

/// Tasks returned by `GET /api/tasks`.
const RECENT_TASKS: usize = 10;

pub async fn status(State(state): State<Arc<AppState>>) -> Json<AggregateStats> {
    Json(state.engine.aggregate_stats())
}

#[derive(Serialize, Deserialize)]
pub struct TasksResponse {
    pub tasks: Vec<Task>,
    pub total_tasks: usize,
}

pub async fn tasks(State(state): State<Arc<AppState>>) -> Json<TasksResponse> {
    Json(TasksResponse {
        tasks: state.engine.recent_tasks(RECENT_TASKS),
        total_tasks: state.engine.task_count(),
    })
}

#[derive(Serialize, Deserialize)]
pub struct SessionListResponse {
    pub sessions: Vec<Session>,
    pub active_count: usize,
}

pub async fn sessions(State(state): State<Arc<AppState>>) -> Json<SessionListResponse> {
    let sessions = state.engine.sessions();
    Json(SessionListResponse {
        active_count: sessions.len(),
        sessions,
    })
}

#[derive(Deserialize)]
pub struct ExecuteRequest {
    #[serde(default)]
    pub command: String,
}

#[derive(Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub success: bool,
    pub task_id: u64,
    pub result: Outcome,
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// POST /api/execute - route one command outside any session.
pub async fn execute(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>, (StatusCode, Json<ErrorResponse>)> {
    let submission = state
        .engine
        .submit_command(Submitter::Anonymous, &req.command)
        .await;

    let receipt = submission.receipt;
    let Some(task_id) = receipt.task_id else {
        let error = receipt
            .outcome
            .result
            .as_text()
            .unwrap_or("No command provided")
            .to_string();
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                success: false,
                error,
            }),
        ));
    };

    info!(target: "valon::api", "Executed task {} via API", task_id);
    Ok(Json(ExecuteResponse {
        success: true,
        task_id,
        result: receipt.outcome,
    }))
}
