//! JWT claims carried by a session token.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims payload. Nothing else is embedded; role and profile are always
/// read fresh from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user ID.
    pub sub: Uuid,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Issued-at with millisecond precision. Freshness against a password
    /// change is judged on this, not on `iat`.
    pub iat_ms: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}
