//! Client-side metrics
//!
//! Recorded through the `metrics` facade; whether anything listens is the
//! embedding application's choice. Families:
//!
//! - `api_requests_total` (counter): labels `status`, `method`
//! - `api_request_duration_seconds` (histogram): label `status`
//! - `api_transport_errors_total` (counter)
//! - `auth_refresh_total` (counter): label `outcome`
//!   (`ok`, `rejected`, `error`, `malformed`, `joined`)
//! - `session_teardowns_total` (counter)

/// Record a settled API request with its final status.
pub fn record_request(status: u16, method: &str, duration_secs: f64) {
    let status_str = status.to_string();
    metrics::counter!("api_requests_total", "status" => status_str.clone(), "method" => method.to_string())
        .increment(1);
    metrics::histogram!("api_request_duration_seconds", "status" => status_str).record(duration_secs);
}

/// Record a request that produced no response at all.
pub fn record_transport_error() {
    metrics::counter!("api_transport_errors_total").increment(1);
}

/// Record a refresh round outcome, or a caller joining an outstanding one.
pub fn record_refresh(outcome: &str) {
    metrics::counter!("auth_refresh_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record a session teardown (fires once per teardown, not per caller).
pub fn record_teardown() {
    metrics::counter!("session_teardowns_total").increment(1);
}
