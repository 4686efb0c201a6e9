//! Maps domain errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use trailpass_auth::error::AuthError;
use trailpass_core::error::{AppError, ErrorKind};

/// Message rendered in place of any non-operational failure.
pub const GENERIC_MESSAGE: &str = "Something went very wrong!";

/// Error body: `{"status": "fail" | "error", "message": ...}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// `fail` for 4xx, `error` for 5xx.
    pub status: &'static str,
    /// Caller-facing message.
    pub message: String,
}

/// Internal detail attached to every error response as an extension.
///
/// Extensions are never written to the wire; in development mode
/// [`render_error_detail`](crate::middleware::error_detail::render_error_detail)
/// copies this into the body.
#[derive(Debug, Clone)]
pub struct ErrorDetail {
    /// Error category.
    pub kind: ErrorKind,
    /// Message rendered to the caller.
    pub message: String,
    /// Full message including the source chain.
    pub detail: String,
}

/// Handler error type.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self.0.kind {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
            ErrorKind::Authorization => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Internal
            | ErrorKind::Database
            | ErrorKind::Configuration
            | ErrorKind::Serialization
            | ErrorKind::ExternalService => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Renders the detail of an error and every error in its source chain.
fn describe(err: &AppError) -> String {
    let mut out = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = describe(&self.0);

        let message = if self.0.is_operational() {
            self.0.message.clone()
        } else {
            tracing::error!(kind = %self.0.kind, error = %detail, "Request failed");
            GENERIC_MESSAGE.to_string()
        };

        let body = ErrorBody {
            status: if status.is_server_error() { "error" } else { "fail" },
            message: message.clone(),
        };

        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(ErrorDetail {
            kind: self.0.kind,
            message,
            detail,
        });
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AuthError::MissingToken, StatusCode::UNAUTHORIZED),
            (AuthError::StalePassword, StatusCode::UNAUTHORIZED),
            (AuthError::Forbidden, StatusCode::FORBIDDEN),
            (AuthError::ResetTokenInvalidOrExpired, StatusCode::BAD_REQUEST),
            (AuthError::AccountNotFound, StatusCode::NOT_FOUND),
            (AuthError::WrongCurrentPassword, StatusCode::UNAUTHORIZED),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
        assert_eq!(
            ApiError::from(AppError::database("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_message_hidden() {
        let response = ApiError::from(AppError::database("connection refused")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let detail = response.extensions().get::<ErrorDetail>().unwrap();
        assert_eq!(detail.message, GENERIC_MESSAGE);
        assert!(detail.detail.contains("connection refused"));
    }
}
