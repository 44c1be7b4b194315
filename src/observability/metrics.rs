//! Metrics collection and exposition.
//!
//! # Metrics
//! - `humanwork_sync_passes_total` (counter): passes by view and outcome
//! - `humanwork_sync_duration_seconds` (histogram): pass latency by view
//! - `humanwork_content_resolutions_total` (counter): resolutions by outcome
//! - `humanwork_transactions_total` (counter): writes by kind and outcome
//! - `humanwork_ledger_healthy` (gauge): 1=reachable, 0=unreachable
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests that never call [`init_metrics`] pay nothing.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

/// Record a finished synchronization pass.
pub fn record_sync_pass(view: &'static str, success: bool, started: Instant) {
    let outcome = if success { "ok" } else { "failed" };
    counter!("humanwork_sync_passes_total", "view" => view, "outcome" => outcome).increment(1);
    histogram!("humanwork_sync_duration_seconds", "view" => view)
        .record(started.elapsed().as_secs_f64());
}

/// Record one content resolution (`resolved`, `cached`, `placeholder`).
pub fn record_content_resolution(outcome: &'static str) {
    counter!("humanwork_content_resolutions_total", "outcome" => outcome).increment(1);
}

/// Record a submitted transaction.
pub fn record_transaction(kind: &'static str, success: bool) {
    let outcome = if success { "confirmed" } else { "rejected" };
    counter!("humanwork_transactions_total", "kind" => kind, "outcome" => outcome).increment(1);
}

/// Record ledger reachability.
pub fn record_ledger_health(healthy: bool) {
    gauge!("humanwork_ledger_healthy").set(if healthy { 1.0 } else { 0.0 });
}
