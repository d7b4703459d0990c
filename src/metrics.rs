//! Prometheus metrics collection for slroomd.
//!
//! Every helper is a no-op until [`init`] has run, so actors record
//! unconditionally and tests never need a registry.
//!
//! ## Membership Metrics
//!
//! - `slroomd_active_sessions` - Connected session proxies (gauge)
//! - `slroomd_active_rooms` - Room registries (gauge)
//! - `slroomd_room_members{room}` - Members per room (gauge)
//! - `slroomd_message_fanout` - Recipients per chat message (histogram)
//! - `slroomd_dead_letters_total{kind}` - Unhandled messages by kind
//! - `slroomd_routing_misses_total` - Join/leave intents for unknown rooms
//! - `slroomd_handshakes_rejected_total{reason}` - Refused upgrades
//! - `slroomd_cleanup_failures_total` - Failed steps during session teardown

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

pub static DEAD_LETTERS: OnceLock<IntCounterVec> = OnceLock::new();

pub static ROUTING_MISSES: OnceLock<IntCounter> = OnceLock::new();

/// Handshakes refused before upgrade, by reason.
pub static HANDSHAKES_REJECTED: OnceLock<IntCounterVec> = OnceLock::new();

pub static CLEANUP_FAILURES: OnceLock<IntCounter> = OnceLock::new();

// ========================================================================
// Gauges (can increase/decrease)
// ========================================================================

pub static ACTIVE_SESSIONS: OnceLock<IntGauge> = OnceLock::new();

pub static ACTIVE_ROOMS: OnceLock<IntGauge> = OnceLock::new();

pub static ROOM_MEMBERS: OnceLock<IntGaugeVec> = OnceLock::new();

/// Recipients per relayed chat message.
pub static MESSAGE_FANOUT: OnceLock<Histogram> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at server startup before metrics are scraped.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    register!(DEAD_LETTERS, IntCounterVec::new(Opts::new("slroomd_dead_letters_total", "Unhandled messages by kind"), &["kind"]));
    register!(ROUTING_MISSES, IntCounter::new("slroomd_routing_misses_total", "Join/leave intents for unknown rooms"));
    register!(HANDSHAKES_REJECTED, IntCounterVec::new(Opts::new("slroomd_handshakes_rejected_total", "WebSocket upgrades refused"), &["reason"]));
    register!(CLEANUP_FAILURES, IntCounter::new("slroomd_cleanup_failures_total", "Failed steps during session teardown"));
    register!(ACTIVE_SESSIONS, IntGauge::new("slroomd_active_sessions", "Connected session proxies"));
    register!(ACTIVE_ROOMS, IntGauge::new("slroomd_active_rooms", "Room registries"));
    register!(ROOM_MEMBERS, IntGaugeVec::new(Opts::new("slroomd_room_members", "Members per room"), &["room"]));
    register!(MESSAGE_FANOUT, Histogram::with_opts(
        HistogramOpts::new("slroomd_message_fanout", "Recipients per chat message")
            .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 1000.0])));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Helper functions
// ============================================================================

pub fn record_dead_letter(kind: &str) {
    if let Some(m) = DEAD_LETTERS.get() {
        m.with_label_values(&[kind]).inc();
    }
}

pub fn record_routing_miss() {
    if let Some(m) = ROUTING_MISSES.get() {
        m.inc();
    }
}

pub fn record_rejected_handshake(reason: &str) {
    if let Some(m) = HANDSHAKES_REJECTED.get() {
        m.with_label_values(&[reason]).inc();
    }
}

pub fn record_cleanup_failures(count: usize) {
    if let Some(m) = CLEANUP_FAILURES.get() {
        m.inc_by(count as u64);
    }
}

/// Sessions listed in the coordinator's directory.
pub fn set_active_sessions(count: usize) {
    if let Some(m) = ACTIVE_SESSIONS.get() {
        m.set(count as i64);
    }
}

pub fn set_active_rooms(count: usize) {
    if let Some(m) = ACTIVE_ROOMS.get() {
        m.set(count as i64);
    }
}

pub fn set_room_members(room: &str, count: usize) {
    if let Some(m) = ROOM_MEMBERS.get() {
        m.with_label_values(&[room]).set(count as i64);
    }
}

/// Drop the per-room series of a stopped room.
pub fn remove_room_metrics(room: &str) {
    if let Some(m) = ROOM_MEMBERS.get() {
        let _ = m.remove_label_values(&[room]);
    }
}

pub fn observe_fanout(recipients: usize) {
    if let Some(m) = MESSAGE_FANOUT.get() {
        m.observe(recipients as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_metrics_appear_in_the_exposition() {
        init();
        record_routing_miss();
        record_rejected_handshake("missing_session");
        set_room_members("metrics-probe", 2);

        let text = gather_metrics();
        assert!(text.contains("slroomd_routing_misses_total"));
        assert!(text.contains(r#"slroomd_handshakes_rejected_total{reason="missing_session"}"#));
        assert!(text.contains(r#"slroomd_room_members{room="metrics-probe"} 2"#));
    }
}
