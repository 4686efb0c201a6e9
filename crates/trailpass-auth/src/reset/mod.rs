//! One-time password reset tokens.

pub mod secret;
pub mod service;

pub use secret::{ResetSecret, digest_token};
pub use service::{PasswordResetService, ResetIssued};
