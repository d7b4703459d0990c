//! Unified error handling for slroomd.
//!
//! This module provides the error hierarchy for the room daemon, with
//! automatic conversions and metric labeling.

use crate::actor::ActorPath;
use slroom_proto::ProtocolError;
use thiserror::Error;

// ============================================================================
// Actor Errors (process lifecycle and delivery)
// ============================================================================

/// Errors raised by the actor runtime and by actor lifecycle hooks.
#[derive(Debug, Error)]
pub enum ActorError {
    #[error("actor {0} already exists")]
    AlreadyExists(ActorPath),

    #[error("invalid actor name: {0:?}")]
    InvalidName(String),

    #[error("mailbox of {0} is closed")]
    MailboxClosed(ActorPath),

    #[error("actor {path} failed to start: {reason}")]
    StartFailed { path: ActorPath, reason: String },

    /// Best-effort cleanup finished with one or more failed steps.
    #[error("{} cleanup step(s) failed: {}", .0.len(), summarize(.0))]
    Cleanup(Vec<ActorError>),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("coordinator unavailable")]
    CoordinatorUnavailable,
}

fn summarize(errors: &[ActorError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ActorError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyExists(_) => "already_exists",
            Self::InvalidName(_) => "invalid_name",
            Self::MailboxClosed(_) => "mailbox_closed",
            Self::StartFailed { .. } => "start_failed",
            Self::Cleanup(_) => "cleanup",
            Self::Transport(e) => e.error_code(),
            Self::CoordinatorUnavailable => "coordinator_unavailable",
        }
    }
}

// ============================================================================
// Transport Errors (connection I/O)
// ============================================================================

/// Connection-level failures. All of them end the owning session's pump.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("read failed: {0}")]
    Read(String),

    #[error("write failed: {0}")]
    Write(String),

    #[error("decode failed: {0}")]
    Decode(#[from] ProtocolError),

    #[error("no frame within {0:?}")]
    Timeout(std::time::Duration),

    #[error("connection closed")]
    Closed,
}

impl TransportError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Read(_) => "read",
            Self::Write(_) => "write",
            Self::Decode(_) => "decode",
            Self::Timeout(_) => "timeout",
            Self::Closed => "closed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_error_summarizes_every_failure() {
        let path = ActorPath::root("coordinator").unwrap();
        let err = ActorError::Cleanup(vec![
            ActorError::MailboxClosed(path.child("a").unwrap()),
            ActorError::Transport(TransportError::Closed),
        ]);
        let text = err.to_string();
        assert!(text.starts_with("2 cleanup step(s) failed"));
        assert!(text.contains("/coordinator/a"));
        assert!(text.contains("connection closed"));
        assert_eq!(err.error_code(), "cleanup");
    }

    #[test]
    fn transport_codes_pass_through() {
        let err = ActorError::from(TransportError::Timeout(std::time::Duration::from_secs(1)));
        assert_eq!(err.error_code(), "timeout");
    }
}
