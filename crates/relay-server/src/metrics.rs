//! Metrics collection and export for the relay.
//!
//! Uses the `metrics` crate for instrumentation and exports
//! to Prometheus format.

use anyhow::{Context, Result};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tenvis_relay_core::Fanout;
use tracing::info;

/// Metric names.
pub mod names {
    pub const CONNECTIONS_TOTAL: &str = "relay_connections_total";
    pub const CONNECTIONS_ACTIVE: &str = "relay_connections_active";
    pub const USERS_ONLINE: &str = "relay_users_online";
    pub const EVENTS_TOTAL: &str = "relay_events_total";
    pub const EVENTS_BYTES: &str = "relay_events_bytes";
    pub const DELIVERIES_TOTAL: &str = "relay_deliveries_total";
    pub const DROPPED_TOTAL: &str = "relay_dropped_total";
    pub const DELIVERY_FAILURES_TOTAL: &str = "relay_delivery_failures_total";
    pub const LATENCY_SECONDS: &str = "relay_latency_seconds";
    pub const ERRORS_TOTAL: &str = "relay_errors_total";
}

/// Initialize the metrics system.
pub fn init_metrics() {
    metrics::describe_counter!(
        names::CONNECTIONS_TOTAL,
        "Total number of connections since server start"
    );
    metrics::describe_gauge!(
        names::CONNECTIONS_ACTIVE,
        "Current number of active connections"
    );
    metrics::describe_gauge!(
        names::USERS_ONLINE,
        "Current number of users with at least one connection"
    );
    metrics::describe_counter!(names::EVENTS_TOTAL, "Total number of events processed");
    metrics::describe_counter!(names::EVENTS_BYTES, "Total bytes of events processed");
    metrics::describe_counter!(
        names::DELIVERIES_TOTAL,
        "Total number of events handed to a connection"
    );
    metrics::describe_counter!(
        names::DROPPED_TOTAL,
        "Total number of events whose target user was offline"
    );
    metrics::describe_counter!(
        names::DELIVERY_FAILURES_TOTAL,
        "Total number of failed per-connection deliveries"
    );
    metrics::describe_histogram!(
        names::LATENCY_SECONDS,
        "Inbound event routing latency in seconds"
    );
    metrics::describe_counter!(names::ERRORS_TOTAL, "Total number of errors");

    info!("Metrics initialized");
}

/// Start the Prometheus metrics server.
///
/// # Errors
///
/// Returns an error if the server cannot be started.
pub fn start_metrics_server(port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus exporter")?;

    info!("Metrics server listening on {}", addr);
    Ok(())
}

/// Record a new connection.
pub fn record_connection() {
    counter!(names::CONNECTIONS_TOTAL).increment(1);
    gauge!(names::CONNECTIONS_ACTIVE).increment(1.0);
}

/// Record a disconnection.
pub fn record_disconnection() {
    gauge!(names::CONNECTIONS_ACTIVE).decrement(1.0);
}

/// Record an inbound event.
pub fn record_event(event: &'static str, bytes: usize) {
    counter!(names::EVENTS_TOTAL, "event" => event).increment(1);
    counter!(names::EVENTS_BYTES, "direction" => "inbound").increment(bytes as u64);
}

/// Record outbound bytes.
pub fn record_outbound(bytes: usize) {
    counter!(names::EVENTS_BYTES, "direction" => "outbound").increment(bytes as u64);
}

/// Record the outcome of routing one event.
pub fn record_fanout(event: &'static str, fanout: &Fanout) {
    counter!(names::DELIVERIES_TOTAL, "event" => event).increment(fanout.delivered as u64);
    if fanout.absent > 0 {
        counter!(names::DROPPED_TOTAL, "event" => event).increment(fanout.absent as u64);
    }
    if fanout.failed > 0 {
        counter!(names::DELIVERY_FAILURES_TOTAL).increment(fanout.failed as u64);
    }
}

/// Update the online user count.
pub fn set_users_online(count: usize) {
    gauge!(names::USERS_ONLINE).set(count as f64);
}

/// Record routing latency.
pub fn record_latency(seconds: f64) {
    histogram!(names::LATENCY_SECONDS).record(seconds);
}

/// Record an error.
pub fn record_error(error_type: &'static str) {
    counter!(names::ERRORS_TOTAL, "type" => error_type).increment(1);
}

/// Metrics guard that records disconnection on drop.
pub struct ConnectionMetricsGuard;

impl ConnectionMetricsGuard {
    /// Create a new metrics guard, recording a connection.
    #[must_use]
    pub fn new() -> Self {
        record_connection();
        Self
    }
}

impl Default for ConnectionMetricsGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConnectionMetricsGuard {
    fn drop(&mut self) {
        record_disconnection();
    }
}
