//! The user persistence seam consumed by the credential core.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use trailpass_core::result::AppResult;
use trailpass_entity::user::{NewUser, PendingReset, User};

/// Narrow interface over whatever holds user records.
///
/// Implementations must make each conditional method a single atomic step:
/// the condition and the write it guards must not be separable by a
/// concurrent writer.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Find a user by primary key, active or not.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find a user by email (case-insensitive), active or not.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Create a new user. Fails with a conflict if the email is taken.
    async fn create(&self, data: &NewUser) -> AppResult<User>;

    /// Unconditionally replace the password hash and stamp the change time.
    ///
    /// Returns `false` if no active user has this id.
    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Replace the password hash only if the stored hash still equals
    /// `expected_hash`.
    ///
    /// Returns `false` if the user is gone, inactive, or the hash moved.
    async fn swap_password(
        &self,
        id: Uuid,
        expected_hash: &str,
        new_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Record a pending reset, overwriting any previous one.
    ///
    /// Returns `false` if no active user has this id.
    async fn set_reset(&self, id: Uuid, reset: &PendingReset) -> AppResult<bool>;

    /// Find the active user whose pending reset digest is `token_hash` and
    /// is still live at `now`.
    ///
    /// Advisory only: the answer may be stale by the time the caller acts
    /// on it. Redemption must go through [`UserStore::redeem_reset`].
    async fn find_by_reset(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<User>>;

    /// Clear the pending reset only if its digest is still `token_hash`.
    async fn clear_reset(&self, id: Uuid, token_hash: &str) -> AppResult<bool>;

    /// Redeem a reset in one step.
    ///
    /// Matches the active user whose pending reset digest equals
    /// `token_hash` and whose expiry is after `now`; for that user the reset
    /// is cleared, the password hash replaced, and the change time set to
    /// `now`. Returns the updated user, or `None` if nothing matched.
    async fn redeem_reset(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
        new_password_hash: &str,
    ) -> AppResult<Option<User>>;

    /// Soft-delete a user.
    async fn deactivate(&self, id: Uuid) -> AppResult<bool>;
}
