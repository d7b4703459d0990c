//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, ServerConfig, RoomsConfig)
//! - [`listen`]: Listener and WebSocket configuration (ListenConfig, WebSocketConfig)
//! - [`defaults`]: serde default functions
//! - [`validation`]: startup checks

mod defaults;
mod listen;
mod types;
mod validation;

pub use listen::WebSocketConfig;
pub use types::{Config, LogFormat};
pub use validation::validate;
