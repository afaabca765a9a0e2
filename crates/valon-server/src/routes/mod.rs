//! HTTP route handlers.

pub mod api;
pub mod ws;

use crate::state::AppState;
use axum::{
    Json, Router,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the full application router.
pub fn app(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/status", get(api::status))
        .route("/tasks", get(api::tasks))
        .route("/sessions", get(api::sessions))
        .route("/execute", post(api::execute))
        .route("/health", get(health));

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(ws::upgrade))
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}
