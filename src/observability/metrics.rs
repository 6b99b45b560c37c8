//! Connector metrics.
//!
//! # Metrics
//! - `aegis_connector_operations_total` (counter): operations by name and outcome
//! - `aegis_connector_operation_duration_seconds` (histogram): latency per operation
//! - `aegis_connector_endpoint_up` (gauge): 1 after a successful liveness check, 0 after a failed one

use std::time::Instant;

/// Record one finished connector operation.
pub fn record_operation(operation: &'static str, success: bool, started: Instant) {
    let outcome = if success { "success" } else { "failure" };
    ::metrics::counter!(
        "aegis_connector_operations_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
    ::metrics::histogram!(
        "aegis_connector_operation_duration_seconds",
        "operation" => operation
    )
    .record(started.elapsed().as_secs_f64());
}

/// Record the result of a liveness check.
pub fn record_endpoint_health(healthy: bool) {
    ::metrics::gauge!("aegis_connector_endpoint_up").set(if healthy { 1.0 } else { 0.0 });
}
