//! Shared fixtures for unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::DateTime;
use uuid::Uuid;

use trailpass_core::clock::{Clock, ManualClock};
use trailpass_core::config::{Argon2Config, AuthConfig};
use trailpass_core::error::AppError;
use trailpass_core::result::AppResult;
use trailpass_database::MemoryUserStore;
use trailpass_database::store::UserStore;
use trailpass_entity::user::{NewUser, User, UserRole};

use crate::credential::CredentialStore;
use crate::guard::AccessGuard;
use crate::jwt::TokenService;
use crate::notifier::Notifier;
use crate::reset::{PasswordResetService, ResetSecret};
use crate::session::SessionService;

pub(crate) const SECRET: &str = "test-signing-secret-of-at-least-32-bytes";

/// 2024-01-01T00:00:00Z.
pub(crate) fn start_clock() -> ManualClock {
    ManualClock::new(DateTime::from_timestamp(1_704_067_200, 0).unwrap())
}

/// Default settings with Argon2 costs low enough for tests.
pub(crate) fn cheap_config() -> AuthConfig {
    let mut config = AuthConfig::with_secret(SECRET);
    config.argon2 = Argon2Config {
        memory_kib: 256,
        iterations: 1,
        parallelism: 1,
    };
    config
}

/// Records what would have been sent.
#[derive(Debug, Default)]
pub(crate) struct RecordingNotifier {
    resets: Mutex<Vec<(Uuid, String)>>,
    welcomes: Mutex<Vec<Uuid>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub(crate) fn fail_deliveries(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn resets(&self) -> Vec<(Uuid, String)> {
        self.resets.lock().unwrap().clone()
    }

    pub(crate) fn welcomes(&self) -> Vec<Uuid> {
        self.welcomes.lock().unwrap().clone()
    }

    fn check(&self) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::external_service("relay unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_password_reset(&self, user: &User, secret: &ResetSecret) -> AppResult<()> {
        self.check()?;
        self.resets
            .lock()
            .unwrap()
            .push((user.id, secret.expose().to_string()));
        Ok(())
    }

    async fn send_welcome(&self, user: &User) -> AppResult<()> {
        self.check()?;
        self.welcomes.lock().unwrap().push(user.id);
        Ok(())
    }
}

/// Every service wired over one in-memory store and one manual clock.
pub(crate) struct Fixture {
    pub store: Arc<MemoryUserStore>,
    pub clock: ManualClock,
    pub credentials: Arc<CredentialStore>,
    pub tokens: TokenService,
    pub notifier: Arc<RecordingNotifier>,
    pub resets: PasswordResetService,
    pub guard: AccessGuard,
    pub sessions: SessionService,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        let config = cheap_config();
        let clock = start_clock();
        let shared_clock: Arc<dyn Clock> = Arc::new(clock.clone());
        let store = Arc::new(MemoryUserStore::with_clock(shared_clock.clone()));
        let users: Arc<dyn UserStore> = store.clone();
        let notifier = Arc::new(RecordingNotifier::default());

        let credentials = Arc::new(
            CredentialStore::new(users.clone(), &config, shared_clock.clone()).unwrap(),
        );
        let tokens = TokenService::new(&config, shared_clock.clone()).unwrap();
        let resets = PasswordResetService::new(
            users.clone(),
            credentials.clone(),
            tokens.clone(),
            notifier.clone(),
            &config,
            shared_clock,
        )
        .unwrap();
        let guard = AccessGuard::new(tokens.clone(), credentials.clone(), users.clone(), &config);
        let sessions =
            SessionService::new(users, credentials.clone(), tokens.clone(), notifier.clone());

        Self {
            store,
            clock,
            credentials,
            tokens,
            notifier,
            resets,
            guard,
            sessions,
        }
    }

    /// Creates `u@x.com` with password `Secret123!`.
    pub(crate) async fn user(&self) -> User {
        let password_hash = self.credentials.hash_password("Secret123!").await.unwrap();
        self.store
            .create(&NewUser {
                name: "Test User".to_string(),
                email: "u@x.com".to_string(),
                password_hash,
                role: UserRole::User,
            })
            .await
            .unwrap()
    }
}
