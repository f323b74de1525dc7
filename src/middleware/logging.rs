//! Request logging middleware.
//!
//! Records method, path, status code, and latency for every request.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{info, warn};

/// Log each HTTP request once the response is ready.
///
/// Server errors log at WARN. Unauthorized responses get their own message
/// so rejected credentials stand out in the stream. `/health` is skipped.
pub async fn request_logging(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    if path == "/health" {
        return next.run(request).await;
    }

    let start = Instant::now();
    let response = next.run(request).await;

    let status = response.status();
    let latency_ms = start.elapsed().as_millis();

    if status.is_server_error() {
        warn!(%method, %path, status = status.as_u16(), latency_ms, "Request failed (5xx)");
    } else if status.as_u16() == 401 {
        info!(%method, %path, latency_ms, "Request rejected (unauthorized)");
    } else {
        info!(%method, %path, status = status.as_u16(), latency_ms, "Request completed");
    }

    response
}
