//! Route handlers.

pub mod auth;

use axum::http::Uri;

use trailpass_core::error::AppError;

use crate::error::ApiError;

/// Fallback for unknown routes.
pub async fn not_found(uri: Uri) -> ApiError {
    AppError::not_found(format!("Can't find {} on this server!", uri.path())).into()
}
