//! Metrics collection and exposition.
//!
//! # Metrics
//! - `poll_live_connect_attempts_total` (counter): connection attempts, first and retried
//! - `poll_live_reconnects_total` (counter): reconnections scheduled after a connection ended
//! - `poll_live_deltas_applied_total` (counter): deltas written into a tally
//! - `poll_live_messages_discarded_total` (counter): inbound frames dropped, by reason
//! - `poll_live_channels_abandoned_total` (counter): channels that exhausted their attempts
//! - `poll_live_active_connections` (gauge): live connections currently held
//!
//! Recording is a no-op until a recorder is installed with [`init_metrics`].

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_connect_attempt() {
    ::metrics::counter!("poll_live_connect_attempts_total").increment(1);
}

pub fn record_reconnect_scheduled() {
    ::metrics::counter!("poll_live_reconnects_total").increment(1);
}

pub fn record_delta_applied() {
    ::metrics::counter!("poll_live_deltas_applied_total").increment(1);
}

/// `reason` is `malformed` or `unknown_option`.
pub fn record_message_discarded(reason: &'static str) {
    ::metrics::counter!("poll_live_messages_discarded_total", "reason" => reason).increment(1);
}

pub fn record_channel_abandoned() {
    ::metrics::counter!("poll_live_channels_abandoned_total").increment(1);
}

pub fn record_connection_opened() {
    ::metrics::gauge!("poll_live_active_connections").increment(1.0);
}

pub fn record_connection_closed() {
    ::metrics::gauge!("poll_live_active_connections").decrement(1.0);
}
