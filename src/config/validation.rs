//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use http::HeaderName;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("server.name is required")]
    MissingServerName,
    #[error("websocket.path must start with '/', got {0:?}")]
    InvalidPath(String),
    #[error("websocket.session_param is required")]
    MissingSessionParam,
    #[error("websocket.room_header is not a valid header name: {0:?}")]
    InvalidRoomHeader(String),
    #[error("websocket.max_message_size must be greater than 0")]
    ZeroMessageSize,
    #[error("websocket.{0} must be greater than 0")]
    ZeroTimeout(&'static str),
    #[error("rooms.preload entry {0:?} is empty or contains '/'")]
    InvalidRoomName(String),
    #[error("server.metrics_port {0} collides with the listen port")]
    MetricsPortConflict(u16),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.name.is_empty() {
        errors.push(ValidationError::MissingServerName);
    }

    let ws = &config.websocket;
    if !ws.path.starts_with('/') {
        errors.push(ValidationError::InvalidPath(ws.path.clone()));
    }
    if ws.session_param.is_empty() {
        errors.push(ValidationError::MissingSessionParam);
    }
    if HeaderName::from_bytes(ws.room_header.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidRoomHeader(ws.room_header.clone()));
    }
    if ws.max_message_size == 0 {
        errors.push(ValidationError::ZeroMessageSize);
    }
    if ws.pong_wait_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("pong_wait_secs"));
    }
    if ws.write_wait_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("write_wait_secs"));
    }

    // Room names become actor path segments.
    for name in &config.rooms.preload {
        if name.is_empty() || name.contains('/') {
            errors.push(ValidationError::InvalidRoomName(name.clone()));
        }
    }

    let metrics_port = config.server.metrics_port;
    if metrics_port != 0 && metrics_port == config.listen.address.port() {
        errors.push(ValidationError::MetricsPortConflict(metrics_port));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_valid_config() -> String {
        r#"
[server]
name = "test.server"

[listen]
address = "127.0.0.1:8080"
"#
        .to_string()
    }

    #[test]
    fn test_valid_config_passes() {
        let config: Config = toml::from_str(&minimal_valid_config()).unwrap();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_server_name_fails() {
        let toml = r#"
[server]
name = ""
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::MissingServerName)));
    }

    #[test]
    fn test_every_problem_is_reported() {
        let toml = r#"
[websocket]
path = "ws"
room_header = "bad header"
pong_wait_secs = 0

[rooms]
preload = ["ok", "a/b", ""]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidPath(_))));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidRoomHeader(_))));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::ZeroTimeout("pong_wait_secs"))));
    }

    #[test]
    fn test_metrics_port_collision_fails() {
        let toml = r#"
[server]
metrics_port = 8080

[listen]
address = "127.0.0.1:8080"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::MetricsPortConflict(8080))));
    }

    #[test]
    fn test_disabled_metrics_never_collide() {
        let toml = r#"
[server]
metrics_port = 0
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(validate(&config).is_ok());
    }
}
