//! Request DTOs with validation.
//!
//! Field names follow the JSON the original clients send (`passwordConfirm`,
//! `passwordCurrent`).

use serde::Deserialize;
use validator::{Validate, ValidationErrors};

use trailpass_core::error::AppError;

/// Signup request body.
#[derive(Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    /// Display name.
    #[validate(length(min = 1, message = "Please tell us your name!"))]
    pub name: String,
    /// Login email.
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    /// Chosen password.
    pub password: String,
    /// Must repeat `password`.
    #[validate(must_match(other = "password", message = "Passwords are not the same!"))]
    pub password_confirm: String,
}

/// Login request body.
#[derive(Clone, Deserialize, Validate)]
pub struct LoginRequest {
    /// Login email.
    #[validate(length(min = 1, message = "Please provide email and password!"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "Please provide email and password!"))]
    pub password: String,
}

/// Forgot-password request body.
#[derive(Clone, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    /// Address of the account to reset.
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
}

/// Reset-password request body. The token travels in the path.
#[derive(Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    /// New password.
    pub password: String,
    /// Must repeat `password`.
    #[validate(must_match(other = "password", message = "Passwords are not the same!"))]
    pub password_confirm: String,
}

/// Update-my-password request body.
#[derive(Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    /// Current password.
    #[validate(length(min = 1, message = "Please provide your current password"))]
    pub password_current: String,
    /// New password.
    pub password: String,
    /// Must repeat `password`.
    pub password_confirm: String,
}

/// Runs `Validate` and maps failures to a single validation error.
pub fn validate_body<T: Validate>(body: &T) -> Result<(), AppError> {
    body.validate().map_err(|e| AppError::validation(describe(&e)))
}

fn describe(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_values()
        .flat_map(|errs| errs.iter())
        .map(|e| {
            e.message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value ({})", e.code))
        })
        .collect();
    messages.sort();
    messages.dedup();
    format!("Invalid input data. {}", messages.join(". "))
}
