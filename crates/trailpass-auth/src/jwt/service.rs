//! Session token issuance and verification.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;
use uuid::Uuid;

use trailpass_core::clock::Clock;
use trailpass_core::config::{AuthConfig, MIN_SECRET_LENGTH};
use trailpass_core::error::AppError;
use trailpass_core::result::AppResult;

use super::claims::Claims;
use crate::error::{AuthError, AuthResult};

/// A freshly signed token together with its validity window.
#[derive(Clone)]
pub struct IssuedToken {
    /// Compact JWS serialization.
    pub token: String,
    /// Issuance instant, millisecond precision.
    pub issued_at: DateTime<Utc>,
    /// Expiry instant, truncated to whole seconds.
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// What a valid token proves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedToken {
    /// The user the token was issued to.
    pub subject: Uuid,
    /// Issued-at, milliseconds since epoch.
    pub issued_at_ms: i64,
}

/// Issues and verifies HS256 session tokens.
///
/// Holds no per-session state: a token is valid iff its signature checks
/// out and the clock has not passed its expiry.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Builds the service from configuration.
    ///
    /// Fails with a configuration error if the secret is missing or shorter
    /// than [`MIN_SECRET_LENGTH`] bytes.
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> AppResult<Self> {
        let secret = config.jwt_secret.as_bytes();
        if secret.is_empty() {
            return Err(AppError::configuration("auth.jwt_secret is not set"));
        }
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(AppError::configuration(format!(
                "auth.jwt_secret must be at least {MIN_SECRET_LENGTH} bytes"
            )));
        }

        let ttl_minutes = i64::try_from(config.token_ttl_minutes)
            .map_err(|_| AppError::configuration("auth.token_ttl_minutes is too large"))?;
        let ttl = Duration::try_minutes(ttl_minutes)
            .ok_or_else(|| AppError::configuration("auth.token_ttl_minutes is too large"))?;

        // Expiry is checked against the injected clock, not the system time.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "iat", "exp"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
            clock,
        })
    }

    /// Configured token lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Signs a token for `subject`, valid from now for the configured TTL.
    pub fn issue(&self, subject: Uuid) -> AppResult<IssuedToken> {
        let now = self.clock.now();
        let iat = now.timestamp();
        let iat_ms = now.timestamp_millis();
        let exp = iat.saturating_add(self.ttl.num_seconds());

        let claims = Claims {
            sub: subject,
            iat,
            iat_ms,
            exp,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign token: {e}")))?;

        debug!(user_id = %subject, exp, "Issued session token");

        Ok(IssuedToken {
            token,
            issued_at: DateTime::from_timestamp_millis(iat_ms).unwrap_or(now),
            expires_at: DateTime::from_timestamp(exp, 0).unwrap_or(DateTime::<Utc>::MAX_UTC),
        })
    }

    /// Checks signature and expiry.
    ///
    /// Malformed and tampered tokens both fail with
    /// [`AuthError::InvalidSignature`]; a well-signed token whose `exp` is in
    /// the past fails with [`AuthError::Expired`].
    pub fn verify(&self, token: &str) -> AuthResult<VerifiedToken> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            debug!(error = %e, "Rejected session token");
            AuthError::InvalidSignature
        })?;
        let claims = data.claims;

        if self.clock.now().timestamp() > claims.exp {
            return Err(AuthError::Expired);
        }

        Ok(VerifiedToken {
            subject: claims.sub,
            issued_at_ms: claims.iat_ms,
        })
    }
}
