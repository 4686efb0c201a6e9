//! Request/response logging middleware.

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::info;

/// Logs request method, path, status, and duration.
///
/// Only the path is logged: reset tokens travel in the path, so it is
/// reduced to its route prefix for that endpoint.
pub async fn request_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = redact_path(request.uri().path());
    let start = Instant::now();

    let response = next.run(request).await;

    info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        "HTTP request"
    );

    response
}

fn redact_path(path: &str) -> String {
    const RESET_PREFIX: &str = "/api/v1/users/reset-password/";
    match path.strip_prefix(RESET_PREFIX) {
        Some(_) => format!("{RESET_PREFIX}<redacted>"),
        None => path.to_string(),
    }
}
