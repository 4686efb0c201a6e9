//! Password storage and verification for user records.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use trailpass_core::clock::Clock;
use trailpass_core::config::AuthConfig;
use trailpass_core::error::AppError;
use trailpass_core::result::AppResult;
use trailpass_database::store::UserStore;
use trailpass_entity::user::User;

use crate::error::{AuthError, AuthResult};
use crate::password::{PasswordHasher, PasswordValidator};

/// Owns the password hash and `password_changed_at` of every user record.
///
/// Every write that replaces a password also stamps the change time from
/// the injected clock in the same store call, so tokens issued before it
/// become stale the moment the call returns.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    validator: PasswordValidator,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("hasher", &self.hasher)
            .field("validator", &self.validator)
            .finish_non_exhaustive()
    }
}

impl CredentialStore {
    /// Creates the credential store.
    pub fn new(
        store: Arc<dyn UserStore>,
        config: &AuthConfig,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self> {
        Ok(Self {
            store,
            hasher: PasswordHasher::new(config)?,
            validator: PasswordValidator::new(config),
            clock,
        })
    }

    /// The password policy applied to every new password.
    pub fn validator(&self) -> &PasswordValidator {
        &self.validator
    }

    /// Compares a candidate against a stored hash. A mismatch is `Ok(false)`.
    pub async fn verify_password(&self, candidate: &str, stored_hash: &str) -> AppResult<bool> {
        self.hasher.verify_password(candidate, stored_hash).await
    }

    /// Hashes a plaintext password without applying the policy.
    pub async fn hash_password(&self, plain: &str) -> AppResult<String> {
        self.hasher.hash_password(plain).await
    }

    /// Whether a token issued at `issued_at_ms` (milliseconds) is no older
    /// than the user's last password change.
    pub fn is_fresh(&self, user: &User, issued_at_ms: i64) -> bool {
        !user.changed_password_after(issued_at_ms)
    }

    /// Replaces the password of an active user unconditionally.
    pub async fn set_password(&self, user_id: Uuid, new_plain: &str) -> AuthResult<()> {
        self.validator.validate(new_plain)?;
        let hash = self.hasher.hash_password(new_plain).await?;

        let updated = self
            .store
            .update_password(user_id, &hash, self.clock.now())
            .await?;
        if !updated {
            return Err(AppError::not_found("User not found").into());
        }

        info!(user_id = %user_id, "Password set");
        Ok(())
    }

    /// The "update my password" flow.
    ///
    /// The new hash is written only if the stored hash is still the one the
    /// current password was checked against; a concurrent change wins and
    /// this call fails with a conflict.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current: &str,
        new_plain: &str,
        confirmation: &str,
    ) -> AuthResult<User> {
        let mut user = match self.store.find_by_id(user_id).await? {
            Some(user) if user.active => user,
            _ => return Err(AuthError::UserNotFound),
        };

        if !self.verify_password(current, &user.password_hash).await? {
            warn!(user_id = %user_id, "Password change rejected: wrong current password");
            return Err(AuthError::WrongCurrentPassword);
        }

        self.validator
            .validate_with_confirmation(new_plain, confirmation)?;
        let new_hash = self.hasher.hash_password(new_plain).await?;
        let changed_at = self.clock.now();

        let swapped = self
            .store
            .swap_password(user_id, &user.password_hash, &new_hash, changed_at)
            .await?;
        if !swapped {
            return Err(AppError::conflict(
                "Password was changed concurrently. Please try again.",
            )
            .into());
        }

        info!(user_id = %user_id, "Password changed");
        user.password_hash = new_hash;
        user.password_changed_at = Some(changed_at);
        Ok(user)
    }

    /// Redeems a pending reset identified by its digest and installs the
    /// new password.
    ///
    /// A digest that matches no live reset fails before the policy is
    /// applied. The write itself is the store's single compare-and-clear,
    /// evaluated against the clock after hashing, so only one of several
    /// concurrent callers can succeed.
    pub async fn redeem_reset(&self, token_hash: &str, new_plain: &str) -> AuthResult<User> {
        if self
            .store
            .find_by_reset(token_hash, self.clock.now())
            .await?
            .is_none()
        {
            return Err(AuthError::ResetTokenInvalidOrExpired);
        }

        self.validator.validate(new_plain)?;
        let new_hash = self.hasher.hash_password(new_plain).await?;

        let user = self
            .store
            .redeem_reset(token_hash, self.clock.now(), &new_hash)
            .await?
            .ok_or(AuthError::ResetTokenInvalidOrExpired)?;

        info!(user_id = %user.id, "Password reset redeemed");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Fixture;
    use chrono::Duration;
    use trailpass_core::error::ErrorKind;

    #[tokio::test]
    async fn test_verify_password() {
        let fx = Fixture::new();
        let user = fx.user().await;

        assert!(fx.credentials.verify_password("Secret123!", &user.password_hash).await.unwrap());
        assert!(!fx.credentials.verify_password("Secret123?", &user.password_hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_set_password_stamps_change_time() {
        let fx = Fixture::new();
        let user = fx.user().await;
        fx.clock.advance(Duration::seconds(30));

        fx.credentials.set_password(user.id, "NewPass1!").await.unwrap();

        let stored = fx.store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.password_changed_at, Some(fx.clock.now()));
        assert!(fx.credentials.verify_password("NewPass1!", &stored.password_hash).await.unwrap());
        assert!(!fx.credentials.verify_password("Secret123!", &stored.password_hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_set_password_applies_policy() {
        let fx = Fixture::new();
        let user = fx.user().await;

        let err = fx.credentials.set_password(user.id, "short").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_set_password_for_unknown_user() {
        let fx = Fixture::new();
        let err = fx
            .credentials
            .set_password(Uuid::new_v4(), "NewPass1!")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_change_password_requires_current() {
        let fx = Fixture::new();
        let user = fx.user().await;

        let err = fx
            .credentials
            .change_password(user.id, "Wrong123!", "NewPass1!", "NewPass1!")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::WrongCurrentPassword));

        let updated = fx
            .credentials
            .change_password(user.id, "Secret123!", "NewPass1!", "NewPass1!")
            .await
            .unwrap();
        assert_eq!(updated.password_changed_at, Some(fx.clock.now()));
    }

    #[tokio::test]
    async fn test_change_password_confirmation_mismatch() {
        let fx = Fixture::new();
        let user = fx.user().await;

        let err = fx
            .credentials
            .change_password(user.id, "Secret123!", "NewPass1!", "NewPass2!")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_concurrent_change_conflicts() {
        let fx = Fixture::new();
        let user = fx.user().await;

        let (a, b) = tokio::join!(
            fx.credentials
                .change_password(user.id, "Secret123!", "NewPass1!", "NewPass1!"),
            fx.credentials
                .change_password(user.id, "Secret123!", "NewPass2!", "NewPass2!"),
        );

        let outcomes = [a, b];
        let ok = outcomes.iter().filter(|r| r.is_ok()).count();
        let conflicts = outcomes
            .iter()
            .filter(|r| matches!(r, Err(e) if e.kind() == ErrorKind::Conflict))
            .count();
        assert_eq!(ok, 1);
        assert_eq!(conflicts, 1);
    }
}
