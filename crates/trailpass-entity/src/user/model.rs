//! User entity model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use uuid::Uuid;

use super::role::UserRole;

/// An outstanding password-reset request.
///
/// Only the digest of the reset secret is kept; the secret itself is handed
/// to the caller once and never stored.
#[derive(Clone, PartialEq, Eq)]
pub struct PendingReset {
    /// Hex-encoded SHA-256 digest of the reset secret.
    pub token_hash: String,
    /// Instant after which the reset can no longer be redeemed.
    pub expires_at: DateTime<Utc>,
}

impl PendingReset {
    /// A reset is redeemable only while `now` is strictly before its expiry.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

impl fmt::Debug for PendingReset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingReset")
            .field("token_hash", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// A registered user.
#[derive(Clone, Serialize)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Login email address, unique case-insensitively.
    pub email: String,
    /// User role (RBAC).
    pub role: UserRole,
    /// Argon2id password hash in PHC string format.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// When the password was last changed. `None` if never changed since
    /// the account was created.
    #[serde(skip_serializing)]
    pub password_changed_at: Option<DateTime<Utc>>,
    /// Outstanding reset request, if any.
    #[serde(skip_serializing)]
    pub pending_reset: Option<PendingReset>,
    /// Soft-delete flag. Inactive users cannot authenticate.
    #[serde(skip_serializing)]
    pub active: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether the password was changed after a token issued at
    /// `issued_at_ms` (milliseconds since epoch).
    ///
    /// A token minted in the same millisecond as the change, such as the one
    /// handed out by the change itself, is still considered fresh.
    pub fn changed_password_after(&self, issued_at_ms: i64) -> bool {
        self.password_changed_at
            .map(|changed_at| changed_at.timestamp_millis() > issued_at_ms)
            .unwrap_or(false)
    }

    /// Returns the pending reset if it is still redeemable at `now`.
    pub fn live_reset(&self, now: DateTime<Utc>) -> Option<&PendingReset> {
        self.pending_reset
            .as_ref()
            .filter(|reset| reset.is_live_at(now))
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("password_changed_at", &self.password_changed_at)
            .field("pending_reset", &self.pending_reset)
            .field("active", &self.active)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

impl<'r> FromRow<'r, PgRow> for User {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let reset_hash: Option<String> = row.try_get("reset_token_hash")?;
        let reset_expires: Option<DateTime<Utc>> = row.try_get("reset_token_expires_at")?;

        let pending_reset = match (reset_hash, reset_expires) {
            (Some(token_hash), Some(expires_at)) => Some(PendingReset {
                token_hash,
                expires_at,
            }),
            (None, None) => None,
            _ => {
                return Err(sqlx::Error::Decode(
                    "reset_token_hash and reset_token_expires_at must be set together".into(),
                ));
            }
        };

        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            role: row.try_get("role")?,
            password_hash: row.try_get("password_hash")?,
            password_changed_at: row.try_get("password_changed_at")?,
            pending_reset,
            active: row.try_get("active")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Data required to create a new user.
#[derive(Clone)]
pub struct NewUser {
    /// Display name.
    pub name: String,
    /// Login email address.
    pub email: String,
    /// Pre-hashed password.
    pub password_hash: String,
    /// Assigned role.
    pub role: UserRole,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}
