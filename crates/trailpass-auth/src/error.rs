//! Authentication failure taxonomy.

use thiserror::Error;

use trailpass_core::error::{AppError, ErrorKind};

/// Result alias for credential and session operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Every way an authentication, authorization, or reset step can fail.
///
/// Display strings are the fixed messages shown to callers; none of them
/// distinguish an unknown account from a wrong password at login.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Login email/password mismatch, or an unknown/inactive account.
    #[error("Incorrect email or password")]
    InvalidCredentials,

    /// No session token in either the header or the cookie.
    #[error("You are not logged in! Please log in to get access.")]
    MissingToken,

    /// Token is malformed, tampered with, or signed with another secret.
    #[error("Invalid token. Please log in again!")]
    InvalidSignature,

    /// Token is past its expiry.
    #[error("Your token has expired! Please log in again.")]
    Expired,

    /// Token was issued before the subject's last password change.
    #[error("User recently changed password! Please log in again.")]
    StalePassword,

    /// Subject of a valid token no longer exists or was deactivated.
    #[error("The user belonging to this token no longer exists.")]
    UserNotFound,

    /// Authenticated, but the role is not in the allow-list.
    #[error("You do not have permission to perform this action.")]
    Forbidden,

    /// Reset token does not match a live pending reset.
    #[error("Token is invalid or has expired.")]
    ResetTokenInvalidOrExpired,

    /// Reset requested for an email with no active account.
    #[error("There is no user with this email address.")]
    AccountNotFound,

    /// Change-password with a wrong current password.
    #[error("Your current password is wrong.")]
    WrongCurrentPassword,

    /// The reset message could not be handed to the notifier.
    #[error("There was an error sending the email. Try again later!")]
    DeliveryFailed,

    /// Anything else: validation, conflicts, storage, hashing.
    #[error(transparent)]
    App(#[from] AppError),
}

impl AuthError {
    /// The application-wide category of this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCredentials
            | Self::MissingToken
            | Self::InvalidSignature
            | Self::Expired
            | Self::StalePassword
            | Self::UserNotFound
            | Self::WrongCurrentPassword => ErrorKind::Authentication,
            Self::Forbidden => ErrorKind::Authorization,
            Self::ResetTokenInvalidOrExpired => ErrorKind::Validation,
            Self::AccountNotFound => ErrorKind::NotFound,
            Self::DeliveryFailed => ErrorKind::ServiceUnavailable,
            Self::App(e) => e.kind,
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::App(inner) => inner,
            other => AppError::new(other.kind(), other.to_string()),
        }
    }
}
