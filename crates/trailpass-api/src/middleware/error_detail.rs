//! Development-mode error detail.

use axum::Json;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::ErrorDetail;
use crate::state::AppState;

/// In development, rewrites error bodies to include the internal detail.
/// In production the response passes through untouched.
pub async fn render_error_detail(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if state.config.environment.is_production() {
        return response;
    }

    let Some(detail) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let status = response.status();
    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);

    let body = json!({
        "status": if status.is_server_error() { "error" } else { "fail" },
        "message": detail.message,
        "error": {
            "kind": detail.kind,
            "statusCode": status.as_u16(),
            "detail": detail.detail,
        },
    });

    let rebuilt = Json(body).into_response();
    let (rebuilt_parts, rebuilt_body) = rebuilt.into_parts();
    parts.headers.extend(rebuilt_parts.headers);
    Response::from_parts(parts, rebuilt_body)
}
