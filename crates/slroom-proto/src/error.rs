//! Error types for the room protocol library.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Errors raised while encoding or decoding wire envelopes.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The frame was not valid JSON or did not match any envelope shape.
    #[error("malformed envelope: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The frame was a binary payload that is not valid UTF-8.
    #[error("frame is not valid UTF-8")]
    InvalidUtf8,

    /// The envelope could not be serialized.
    #[error("failed to encode envelope: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ProtocolError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed",
            Self::InvalidUtf8 => "invalid_utf8",
            Self::Encode(_) => "encode",
        }
    }
}
