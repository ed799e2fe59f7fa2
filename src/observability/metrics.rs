//! Metrics collection.
//!
//! # Metrics
//! - `interservice_outbound_requests_total` (counter): downstream, method, status
//! - `interservice_outbound_duration_seconds` (histogram): downstream, method
//! - `interservice_task_submissions_total` (counter): outcome
//!
//! # Design Decisions
//! - Emitted through the `metrics` facade; the host installs the recorder
//! - `status` is the HTTP status, or `timeout` / `transport` when no
//!   response arrived

use metrics::{counter, histogram};
use std::time::Duration;

/// Record one finished outbound call.
pub fn record_outbound_call(downstream: &str, method: &str, status: &str, elapsed: Duration) {
    counter!(
        "interservice_outbound_requests_total",
        "downstream" => downstream.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        "interservice_outbound_duration_seconds",
        "downstream" => downstream.to_string(),
        "method" => method.to_string()
    )
    .record(elapsed.as_secs_f64());
}

/// Record one executor submission (`rejected`, `complete` or `partial`).
pub fn record_task_submission(outcome: &'static str) {
    counter!("interservice_task_submissions_total", "outcome" => outcome).increment(1);
}
