//! # trailpass-auth
//!
//! Credential and session lifecycle for Trailpass.
//!
//! ## Modules
//!
//! - `credential`: password verification, replacement and reset redemption
//! - `jwt`: stateless session token issuance and verification
//! - `reset`: one-time password reset tokens
//! - `guard`: request authentication and role gating
//! - `session`: signup, login and password-change flows
//! - `cookie`: the session cookie policy
//! - `notifier`: the outbound message seam

pub mod cookie;
pub mod credential;
pub mod error;
pub mod guard;
pub mod jwt;
pub mod notifier;
pub mod password;
pub mod reset;
pub mod session;

#[cfg(test)]
mod test_support;

pub use cookie::SessionCookie;
pub use credential::CredentialStore;
pub use error::{AuthError, AuthResult};
pub use guard::{AccessGuard, CredentialCarrier, Identity};
pub use jwt::{Claims, TokenService};
pub use notifier::{Notifier, TracingNotifier};
pub use password::{PasswordHasher, PasswordValidator};
pub use reset::{PasswordResetService, ResetSecret};
pub use session::{SessionGrant, SessionService, SignupRequest};
