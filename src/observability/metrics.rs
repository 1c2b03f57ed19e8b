//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define relay metrics (control requests, broadcasts, subscribers)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `led_control_requests_total` (counter): control requests by result
//! - `led_broadcasts_total` (counter): broadcast passes
//! - `led_messages_delivered_total` (counter): messages queued to subscribers
//! - `led_subscribers_pruned_total` (counter): subscribers dropped on send failure
//! - `led_subscribers` (gauge): currently registered subscribers
//! - `led_state` (gauge): 1=on, 0=off
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until an
//!   exporter is installed, so tests need no setup

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::broadcast::BroadcastReport;

/// Install the Prometheus exporter with its own HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a control request by result ("applied" or "invalid").
pub fn record_control_request(result: &'static str) {
    metrics::counter!("led_control_requests_total", "result" => result).increment(1);
}

/// Record the outcome of one broadcast pass.
pub fn record_broadcast(report: &BroadcastReport) {
    metrics::counter!("led_broadcasts_total").increment(1);
    metrics::counter!("led_messages_delivered_total").increment(report.delivered as u64);
    if report.pruned > 0 {
        metrics::counter!("led_subscribers_pruned_total").increment(report.pruned as u64);
    }
}

pub fn record_subscriber_count(count: usize) {
    metrics::gauge!("led_subscribers").set(count as f64);
}

pub fn record_led_state(on: bool) {
    metrics::gauge!("led_state").set(if on { 1.0 } else { 0.0 });
}
