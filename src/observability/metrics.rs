//! Metrics collection and exposition.
//!
//! # Metrics
//! - `replay_requests_total` (counter): completed replays by method, status
//! - `replay_request_errors_total` (counter): transport failures by method
//! - `replay_request_duration_seconds` (histogram): replay latency
//! - `replay_records_dropped_total` (counter): records that could not be translated
//! - `replay_in_flight` (gauge): dispatches currently running

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a replayed request that got a response.
pub fn record_response(method: &str, status: u16, elapsed: Duration) {
    counter!(
        "replay_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("replay_request_duration_seconds").record(elapsed.as_secs_f64());
}

/// Record a replayed request that failed in the transport.
pub fn record_transport_error(method: &str, elapsed: Duration) {
    counter!("replay_request_errors_total", "method" => method.to_string()).increment(1);
    histogram!("replay_request_duration_seconds").record(elapsed.as_secs_f64());
}

/// Record a completed record that could not be replayed.
pub fn record_dropped(reason: &'static str) {
    counter!("replay_records_dropped_total", "reason" => reason).increment(1);
}

/// Publish the current number of running dispatches.
pub fn set_in_flight(count: u64) {
    gauge!("replay_in_flight").set(count as f64);
}
