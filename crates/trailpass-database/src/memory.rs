//! In-process user store backed by `DashMap`.
//!
//! Intended for development and tests. Conditional writes re-check their
//! condition while holding the entry's write guard, so two tasks racing on
//! the same record serialize on that guard.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;
use uuid::Uuid;

use trailpass_core::clock::{Clock, SystemClock};
use trailpass_core::error::AppError;
use trailpass_core::result::AppResult;
use trailpass_entity::user::{NewUser, PendingReset, User};

use crate::store::UserStore;

/// In-memory [`UserStore`].
///
/// Clones share the same underlying maps.
#[derive(Debug, Clone)]
pub struct MemoryUserStore {
    /// id → record.
    users: Arc<DashMap<Uuid, User>>,
    /// lowercased email → id.
    emails: Arc<DashMap<String, Uuid>>,
    /// Stamps `created_at`.
    clock: Arc<dyn Clock>,
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl MemoryUserStore {
    /// Create an empty store on the wall clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that reads the time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            users: Arc::new(DashMap::new()),
            emails: Arc::new(DashMap::new()),
            clock,
        }
    }

    /// Number of stored users, active or not.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the store holds no users.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn reset_matches(user: &User, token_hash: &str) -> bool {
        user.pending_reset
            .as_ref()
            .is_some_and(|reset| digests_match(&reset.token_hash, token_hash))
    }
}

/// Compares two digests without short-circuiting on the first mismatch.
fn digests_match(stored: &str, candidate: &str) -> bool {
    let (a, b) = (stored.as_bytes(), candidate.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let id = match self.emails.get(&email.to_lowercase()) {
            Some(entry) => *entry.value(),
            None => return Ok(None),
        };
        self.find_by_id(id).await
    }

    async fn create(&self, data: &NewUser) -> AppResult<User> {
        match self.emails.entry(data.email.to_lowercase()) {
            Entry::Occupied(_) => Err(AppError::conflict(
                "An account with this email already exists",
            )),
            Entry::Vacant(slot) => {
                let user = User {
                    id: Uuid::new_v4(),
                    name: data.name.clone(),
                    email: data.email.clone(),
                    role: data.role,
                    password_hash: data.password_hash.clone(),
                    password_changed_at: None,
                    pending_reset: None,
                    active: true,
                    created_at: self.clock.now(),
                };
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(user)
            }
        }
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        match self.users.get_mut(&id) {
            Some(mut entry) if entry.active => {
                entry.password_hash = password_hash.to_string();
                entry.password_changed_at = Some(changed_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn swap_password(
        &self,
        id: Uuid,
        expected_hash: &str,
        new_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        match self.users.get_mut(&id) {
            Some(mut entry) if entry.active && entry.password_hash == expected_hash => {
                entry.password_hash = new_hash.to_string();
                entry.password_changed_at = Some(changed_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_reset(&self, id: Uuid, reset: &PendingReset) -> AppResult<bool> {
        match self.users.get_mut(&id) {
            Some(mut entry) if entry.active => {
                entry.pending_reset = Some(reset.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_by_reset(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|entry| {
                let user = entry.value();
                user.active
                    && Self::reset_matches(user, token_hash)
                    && user.live_reset(now).is_some()
            })
            .map(|entry| entry.value().clone()))
    }

    async fn clear_reset(&self, id: Uuid, token_hash: &str) -> AppResult<bool> {
        match self.users.get_mut(&id) {
            Some(mut entry) if Self::reset_matches(&entry, token_hash) => {
                entry.pending_reset = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn redeem_reset(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
        new_password_hash: &str,
    ) -> AppResult<Option<User>> {
        // Collect first: iteration holds shard read guards that would
        // deadlock against the write guard taken below.
        let candidates: Vec<Uuid> = self
            .users
            .iter()
            .filter(|entry| Self::reset_matches(entry.value(), token_hash))
            .map(|entry| *entry.key())
            .collect();

        for id in candidates {
            let Some(mut entry) = self.users.get_mut(&id) else {
                continue;
            };
            let user = entry.value_mut();
            let redeemable = user.active
                && Self::reset_matches(user, token_hash)
                && user.live_reset(now).is_some();
            if !redeemable {
                continue;
            }

            user.pending_reset = None;
            user.password_hash = new_password_hash.to_string();
            user.password_changed_at = Some(now);
            debug!(user_id = %user.id, "Reset redeemed");
            return Ok(Some(user.clone()));
        }

        Ok(None)
    }

    async fn deactivate(&self, id: Uuid) -> AppResult<bool> {
        match self.users.get_mut(&id) {
            Some(mut entry) if entry.active => {
                entry.active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
