//! The access guard.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use trailpass_core::config::AuthConfig;
use trailpass_core::error::AppError;
use trailpass_database::store::UserStore;
use trailpass_entity::user::{User, UserRole};

use super::carrier::CredentialCarrier;
use crate::credential::CredentialStore;
use crate::error::{AuthError, AuthResult};
use crate::jwt::TokenService;

/// An authenticated subject, loaded fresh from the store for this request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    /// The user's ID.
    #[serde(rename = "id")]
    pub user_id: Uuid,
    /// Current role.
    pub role: UserRole,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Authenticates requests and enforces role allow-lists.
#[derive(Clone)]
pub struct AccessGuard {
    tokens: TokenService,
    credentials: Arc<CredentialStore>,
    store: Arc<dyn UserStore>,
    lookup_timeout: Duration,
}

impl std::fmt::Debug for AccessGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGuard")
            .field("lookup_timeout", &self.lookup_timeout)
            .finish_non_exhaustive()
    }
}

impl AccessGuard {
    /// Creates the guard.
    pub fn new(
        tokens: TokenService,
        credentials: Arc<CredentialStore>,
        store: Arc<dyn UserStore>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            tokens,
            credentials,
            store,
            lookup_timeout: Duration::from_millis(config.lookup_timeout_ms),
        }
    }

    /// Resolves the carrier to an identity.
    ///
    /// Order: token present, token verifies, subject exists and is active,
    /// token is not older than the subject's last password change.
    pub async fn authenticate(&self, carrier: &CredentialCarrier) -> AuthResult<Identity> {
        let token = carrier.token().ok_or(AuthError::MissingToken)?;
        let verified = self.tokens.verify(token)?;

        let user = tokio::time::timeout(self.lookup_timeout, self.store.find_by_id(verified.subject))
            .await
            .map_err(|_| AppError::service_unavailable("User lookup timed out"))??;

        let user = match user {
            Some(user) if user.active => user,
            _ => {
                debug!(user_id = %verified.subject, "Token subject missing or inactive");
                return Err(AuthError::UserNotFound);
            }
        };

        if !self.credentials.is_fresh(&user, verified.issued_at_ms) {
            debug!(user_id = %user.id, "Token predates password change");
            return Err(AuthError::StalePassword);
        }

        Ok(Identity::from(&user))
    }

    /// Checks role membership only; the token was already checked by
    /// [`authenticate`](Self::authenticate).
    pub fn authorize(&self, identity: &Identity, allowed: &[UserRole]) -> AuthResult<()> {
        authorize(identity, allowed)
    }

    /// Like [`authenticate`](Self::authenticate), but any failure yields an
    /// anonymous caller.
    pub async fn try_authenticate(&self, carrier: &CredentialCarrier) -> Option<Identity> {
        match self.authenticate(carrier).await {
            Ok(identity) => Some(identity),
            Err(e) => {
                debug!(error = %e, "Treating request as anonymous");
                None
            }
        }
    }
}

/// Fails with [`AuthError::Forbidden`] unless the identity's role is in
/// `allowed`.
pub fn authorize(identity: &Identity, allowed: &[UserRole]) -> AuthResult<()> {
    if allowed.contains(&identity.role) {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}
