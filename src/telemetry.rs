//! Tracing setup and span constructors.

use crate::config::LogFormat;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

/// Standardized span constructors for membership observability.
pub mod spans {
    use tracing::{Span, info_span};

    /// Create a span for an actor's lifetime.
    pub fn actor(path: &str) -> Span {
        info_span!("actor", path = %path)
    }

    /// Create a span for an accepted connection.
    pub fn connection(conn_id: &str, addr: &str) -> Span {
        info_span!("connection", conn_id = %conn_id, addr = %addr)
    }
}
