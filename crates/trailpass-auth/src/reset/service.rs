//! Password reset issuance and redemption.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{error, info, warn};

use trailpass_core::clock::Clock;
use trailpass_core::config::AuthConfig;
use trailpass_core::error::AppError;
use trailpass_core::result::AppResult;
use trailpass_database::store::UserStore;
use trailpass_entity::user::{PendingReset, User};

use super::secret::{ResetSecret, digest_token};
use crate::credential::CredentialStore;
use crate::error::{AuthError, AuthResult};
use crate::jwt::TokenService;
use crate::notifier::Notifier;
use crate::session::SessionGrant;

/// A reset that has just been recorded against a user.
#[derive(Debug)]
pub struct ResetIssued {
    /// The user the reset belongs to.
    pub user: User,
    /// Plaintext token; this is the only copy.
    pub secret: ResetSecret,
    /// When the reset stops being redeemable.
    pub expires_at: DateTime<Utc>,
}

/// Issues one-time reset tokens and redeems them exactly once.
///
/// Per user the reset facet is either absent or pending. Requesting while
/// pending overwrites the earlier token; redemption and expiry both return
/// it to absent.
#[derive(Clone)]
pub struct PasswordResetService {
    store: Arc<dyn UserStore>,
    credentials: Arc<CredentialStore>,
    tokens: TokenService,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl std::fmt::Debug for PasswordResetService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordResetService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl PasswordResetService {
    /// Creates the reset service.
    pub fn new(
        store: Arc<dyn UserStore>,
        credentials: Arc<CredentialStore>,
        tokens: TokenService,
        notifier: Arc<dyn Notifier>,
        config: &AuthConfig,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self> {
        let ttl = i64::try_from(config.reset_token_ttl_minutes)
            .ok()
            .and_then(Duration::try_minutes)
            .ok_or_else(|| AppError::configuration("auth.reset_token_ttl_minutes is too large"))?;

        Ok(Self {
            store,
            credentials,
            tokens,
            notifier,
            clock,
            ttl,
        })
    }

    /// Records a new pending reset for the active account with `email`.
    ///
    /// Only the digest and expiry are stored; the plaintext is returned once.
    pub async fn request_reset(&self, email: &str) -> AuthResult<ResetIssued> {
        let user = match self.store.find_by_email(email).await? {
            Some(user) if user.active => user,
            _ => return Err(AuthError::AccountNotFound),
        };

        let secret = ResetSecret::generate();
        let expires_at = self.clock.now() + self.ttl;
        let pending = PendingReset {
            token_hash: secret.digest(),
            expires_at,
        };

        if !self.store.set_reset(user.id, &pending).await? {
            return Err(AuthError::AccountNotFound);
        }

        info!(user_id = %user.id, %expires_at, "Password reset requested");
        Ok(ResetIssued {
            user,
            secret,
            expires_at,
        })
    }

    /// Withdraws an issued reset.
    ///
    /// Clears the pending reset only if it still carries this secret's
    /// digest, so a newer request is never erased. Returns whether anything
    /// was cleared.
    pub async fn abandon(&self, issued: &ResetIssued) -> AppResult<bool> {
        self.store
            .clear_reset(issued.user.id, &issued.secret.digest())
            .await
    }

    /// Requests a reset and hands it to the notifier.
    ///
    /// If delivery fails the reset is withdrawn and the caller gets
    /// [`AuthError::DeliveryFailed`].
    pub async fn request_and_deliver(&self, email: &str) -> AuthResult<()> {
        let issued = self.request_reset(email).await?;

        let Err(send_err) = self
            .notifier
            .send_password_reset(&issued.user, &issued.secret)
            .await
        else {
            return Ok(());
        };

        warn!(user_id = %issued.user.id, error = %send_err, "Reset delivery failed, rolling back");
        match self.abandon(&issued).await {
            Ok(true) => {}
            Ok(false) => info!(user_id = %issued.user.id, "Reset already superseded"),
            Err(e) => error!(user_id = %issued.user.id, error = %e, "Reset rollback failed"),
        }
        Err(AuthError::DeliveryFailed)
    }

    /// Redeems a plaintext reset token, installs `new_password`, and starts
    /// a fresh session.
    pub async fn consume_reset(&self, token: &str, new_password: &str) -> AuthResult<SessionGrant> {
        let user = self
            .credentials
            .redeem_reset(&digest_token(token), new_password)
            .await?;
        Ok(SessionGrant::new(self.tokens.issue(user.id)?, user))
    }
}
