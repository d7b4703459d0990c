//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::defaults::{default_metrics_port, default_server_name};
use super::listen::{ListenConfig, WebSocketConfig};

/// Environment variable overriding the listen port.
pub const PORT_ENV: &str = "PORT";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{PORT_ENV} is not a valid port: {0:?}")]
    InvalidPort(String),
}

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server information.
    #[serde(default)]
    pub server: ServerConfig,
    /// Network listen configuration.
    #[serde(default)]
    pub listen: ListenConfig,
    /// WebSocket upgrade configuration.
    #[serde(default)]
    pub websocket: WebSocketConfig,
    /// Rooms that exist from startup.
    #[serde(default)]
    pub rooms: RoomsConfig,
}

impl Config {
    /// Load configuration from a TOML file, then apply `PORT`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_port_override(std::env::var(PORT_ENV).ok().as_deref())?;
        Ok(config)
    }

    /// Replace the listen port with `port` when it is set and non-empty.
    pub fn apply_port_override(&mut self, port: Option<&str>) -> Result<(), ConfigError> {
        let Some(raw) = port.map(str::trim).filter(|p| !p.is_empty()) else {
            return Ok(());
        };
        let port: u16 = raw
            .parse()
            .map_err(|_| ConfigError::InvalidPort(raw.to_string()))?;
        self.listen.address.set_port(port);
        Ok(())
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name, used as the actor system name and in logs.
    #[serde(default = "default_server_name")]
    pub name: String,
    /// Prometheus metrics HTTP port (default: 9090, 0 disables).
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            metrics_port: default_metrics_port(),
            log_format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Startup rooms.
///
/// `preload_count = 3` creates `room-0`, `room-1` and `room-2`; `preload`
/// adds rooms by name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomsConfig {
    #[serde(default)]
    pub preload: Vec<String>,
    #[serde(default)]
    pub preload_count: usize,
}

impl RoomsConfig {
    /// Every startup room, numbered rooms first, without duplicates.
    pub fn startup_rooms(&self) -> Vec<String> {
        let mut rooms: Vec<String> = (0..self.preload_count).map(|i| format!("room-{i}")).collect();
        for name in &self.preload {
            if !rooms.contains(name) {
                rooms.push(name.clone());
            }
        }
        rooms
    }
}
