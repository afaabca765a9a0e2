//! Valon server library - HTTP/WebSocket transport for the command engine.
//!
//! Separated from main.rs so the router can be driven from integration tests.

pub mod config;
pub mod hub;
pub mod logging;
pub mod routes;
pub mod state;
pub mod websocket;
