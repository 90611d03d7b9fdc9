//! Metrics collection and exposition.
//!
//! # Metrics
//! - `room_display_requests_total` (counter): requests by method, path, status
//! - `room_display_request_duration_seconds` (histogram): latency distribution
//! - `room_display_access_denied_total` (counter): allow-list rejections
//! - `room_display_provider_errors_total` (counter): failed provider calls
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{body::Body, extract::MatchedPath, http::Request, middleware::Next, response::Response};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, path: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];
    counter!("room_display_requests_total", &labels).increment(1);
    histogram!("room_display_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_access_denied() {
    counter!("room_display_access_denied_total").increment(1);
}

pub fn record_provider_error(operation: &'static str) {
    counter!("room_display_provider_errors_total", "operation" => operation).increment(1);
}

/// Middleware recording count and latency per matched route.
pub async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    record_request(&method, &path, response.status().as_u16(), start);
    response
}
