//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use trailpass_auth::cookie::SessionCookie;
use trailpass_auth::credential::CredentialStore;
use trailpass_auth::guard::AccessGuard;
use trailpass_auth::jwt::TokenService;
use trailpass_auth::notifier::Notifier;
use trailpass_auth::reset::PasswordResetService;
use trailpass_auth::session::SessionService;
use trailpass_core::clock::Clock;
use trailpass_core::config::AppConfig;
use trailpass_core::result::AppResult;
use trailpass_database::store::UserStore;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Request authentication and role gating
    pub guard: Arc<AccessGuard>,
    /// Signup, login, and password change
    pub sessions: Arc<SessionService>,
    /// Password reset issuance and redemption
    pub resets: Arc<PasswordResetService>,
    /// `Set-Cookie` builder for the session cookie
    pub cookie: Arc<SessionCookie>,
}

impl AppState {
    /// Wires every service over one store, notifier and clock.
    pub fn build(
        config: AppConfig,
        store: Arc<dyn UserStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self> {
        let auth = &config.auth;

        let tokens = TokenService::new(auth, clock.clone())?;
        let credentials = Arc::new(CredentialStore::new(store.clone(), auth, clock.clone())?);
        let resets = PasswordResetService::new(
            store.clone(),
            credentials.clone(),
            tokens.clone(),
            notifier.clone(),
            auth,
            clock.clone(),
        )?;
        let guard = AccessGuard::new(tokens.clone(), credentials.clone(), store.clone(), auth);
        let sessions = SessionService::new(store, credentials, tokens, notifier);
        let cookie = SessionCookie::new(auth, config.environment, clock);

        Ok(Self {
            config: Arc::new(config),
            guard: Arc::new(guard),
            sessions: Arc::new(sessions),
            resets: Arc::new(resets),
            cookie: Arc::new(cookie),
        })
    }
}
