//! Server configuration.

use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use valon_core::EngineConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_agent_name")]
    pub agent_name: String,
    #[serde(default = "default_status_label")]
    pub status_label: String,
    #[serde(default = "default_system_info")]
    pub system_info: String,
    #[serde(default = "default_max_tasks")]
    pub max_tasks: usize,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_agent_name() -> String {
    "VALON".to_string()
}

fn default_status_label() -> String {
    "Active".to_string()
}

fn default_system_info() -> String {
    format!("VALON Agent v{} - Production", env!("CARGO_PKG_VERSION"))
}

fn default_max_tasks() -> usize {
    1000
}

fn default_max_sessions() -> usize {
    100
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            agent_name: default_agent_name(),
            status_label: default_status_label(),
            system_info: default_system_info(),
            max_tasks: default_max_tasks(),
            max_sessions: default_max_sessions(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config from default location (config/default.toml) or fall back to defaults.
    pub fn load() -> Result<Self> {
        let config_path = PathBuf::from("config/default.toml");
        if config_path.exists() {
            return Self::load_from(&config_path);
        }

        Ok(Config::default())
    }

    /// Port from the `PORT` environment variable, if set and valid.
    pub fn port_from_env() -> Option<u16> {
        std::env::var("PORT").ok()?.trim().parse().ok()
    }

    /// Engine settings derived from this config.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            agent_name: self.agent_name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            status_label: self.status_label.clone(),
            system_info: self.system_info.clone(),
            max_tasks: self.max_tasks,
            max_sessions: self.max_sessions,
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
        }
    }
}
