//! Shared application state.

use crate::config::Config;
use crate::hub::ConnectionHub;
use std::sync::Arc;
use valon_core::Engine;

/// Shared application state.
pub struct AppState {
    pub engine: Arc<Engine>,
    pub hub: Arc<ConnectionHub>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> valon_core::Result<Self> {
        let hub = Arc::new(ConnectionHub::new());
        let engine = Arc::new(Engine::with_http_fetcher(config.engine_config(), hub.clone())?);

        Ok(Self { engine, hub, config })
    }
}
