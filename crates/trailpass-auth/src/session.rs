//! Signup, login and password-change flows.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use trailpass_core::error::AppError;
use trailpass_core::result::AppResult;
use trailpass_database::store::UserStore;
use trailpass_entity::user::{NewUser, User, UserRole};

use crate::credential::CredentialStore;
use crate::error::{AuthError, AuthResult};
use crate::guard::Identity;
use crate::jwt::{IssuedToken, TokenService};
use crate::notifier::Notifier;

/// A newly started session.
#[derive(Clone)]
pub struct SessionGrant {
    /// Signed session token.
    pub token: String,
    /// When the token stops verifying.
    pub expires_at: DateTime<Utc>,
    /// The authenticated user.
    pub user: User,
}

impl SessionGrant {
    /// Pairs an issued token with its user.
    pub fn new(issued: IssuedToken, user: User) -> Self {
        Self {
            token: issued.token,
            expires_at: issued.expires_at,
            user,
        }
    }
}

impl fmt::Debug for SessionGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionGrant")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Input for account creation.
#[derive(Clone)]
pub struct SignupRequest {
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Chosen password.
    pub password: String,
    /// Must repeat `password`.
    pub password_confirm: String,
}

impl fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Session lifecycle flows built from the credential store and the token
/// service. Logout is stateless and lives entirely in
/// [`SessionCookie::cleared`](crate::cookie::SessionCookie::cleared).
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn UserStore>,
    credentials: Arc<CredentialStore>,
    tokens: TokenService,
    notifier: Arc<dyn Notifier>,
}

impl fmt::Debug for SessionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionService")
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl SessionService {
    /// Creates the session service.
    pub fn new(
        store: Arc<dyn UserStore>,
        credentials: Arc<CredentialStore>,
        tokens: TokenService,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            credentials,
            tokens,
            notifier,
        }
    }

    fn grant(&self, user: User) -> AppResult<SessionGrant> {
        Ok(SessionGrant::new(self.tokens.issue(user.id)?, user))
    }

    /// Creates an account with the default role and logs it in.
    ///
    /// A failed welcome message is logged and otherwise ignored.
    pub async fn signup(&self, request: SignupRequest) -> AuthResult<SessionGrant> {
        self.credentials
            .validator()
            .validate_with_confirmation(&request.password, &request.password_confirm)?;
        let password_hash = self.credentials.hash_password(&request.password).await?;

        let user = self
            .store
            .create(&NewUser {
                name: request.name,
                email: request.email,
                password_hash,
                role: UserRole::default(),
            })
            .await?;
        info!(user_id = %user.id, "User signed up");

        if let Err(e) = self.notifier.send_welcome(&user).await {
            warn!(user_id = %user.id, error = %e, "Welcome message failed");
        }

        Ok(self.grant(user)?)
    }

    /// Exchanges email and password for a session.
    ///
    /// Unknown, inactive, and wrong-password cases are indistinguishable to
    /// the caller.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<SessionGrant> {
        let user = match self.store.find_by_email(email).await? {
            Some(user) if user.active => user,
            _ => return Err(AuthError::InvalidCredentials),
        };

        if !self
            .credentials
            .verify_password(password, &user.password_hash)
            .await?
        {
            warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        info!(user_id = %user.id, "User logged in");
        Ok(self.grant(user)?)
    }

    /// Changes the caller's password and starts a new session; every token
    /// issued before the change stops authenticating.
    pub async fn change_password(
        &self,
        identity: &Identity,
        current: &str,
        new_password: &str,
        confirmation: &str,
    ) -> AuthResult<SessionGrant> {
        let user = self
            .credentials
            .change_password(identity.user_id, current, new_password, confirmation)
            .await?;
        Ok(self.grant(user)?)
    }

    /// Soft-deletes an account. Every outstanding token for it stops
    /// authenticating on its next use.
    pub async fn deactivate(&self, user_id: Uuid) -> AuthResult<()> {
        if !self.store.deactivate(user_id).await? {
            return Err(AppError::not_found("No active user found with that ID").into());
        }
        info!(user_id = %user_id, "User deactivated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::CredentialCarrier;
    use crate::test_support::Fixture;
    use chrono::Duration;
    use trailpass_core::error::ErrorKind;

    fn signup_request(email: &str) -> SignupRequest {
        SignupRequest {
            name: "New Hiker".to_string(),
            email: email.to_string(),
            password: "Secret123!".to_string(),
            password_confirm: "Secret123!".to_string(),
        }
    }

    #[tokio::test]
    async fn test_signup_creates_user_and_session() {
        let fx = Fixture::new();

        let grant = fx.sessions.signup(signup_request("new@x.com")).await.unwrap();
        assert_eq!(grant.user.role, UserRole::User);
        assert_eq!(fx.tokens.verify(&grant.token).unwrap().subject, grant.user.id);
        assert_eq!(fx.notifier.welcomes(), vec![grant.user.id]);
    }

    #[tokio::test]
    async fn test_signup_duplicate_email() {
        let fx = Fixture::new();
        fx.sessions.signup(signup_request("new@x.com")).await.unwrap();

        let err = fx
            .sessions
            .signup(signup_request("NEW@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_signup_survives_welcome_failure() {
        let fx = Fixture::new();
        fx.notifier.fail_deliveries(true);
        assert!(fx.sessions.signup(signup_request("new@x.com")).await.is_ok());
    }

    #[tokio::test]
    async fn test_signup_requires_matching_confirmation() {
        let fx = Fixture::new();
        let mut request = signup_request("new@x.com");
        request.password_confirm = "Secret123?".to_string();

        let err = fx.sessions.signup(request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(fx.store.is_empty());
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let fx = Fixture::new();
        let user = fx.user().await;

        let wrong = fx.sessions.login("u@x.com", "Secret123?").await.unwrap_err();
        let unknown = fx.sessions.login("nobody@x.com", "Secret123!").await.unwrap_err();
        fx.store.deactivate(user.id).await.unwrap();
        let inactive = fx.sessions.login("u@x.com", "Secret123!").await.unwrap_err();

        for err in [wrong, unknown, inactive] {
            assert!(matches!(err, AuthError::InvalidCredentials));
            assert_eq!(err.to_string(), "Incorrect email or password");
        }
    }

    #[tokio::test]
    async fn test_password_change_scenario() {
        let fx = Fixture::new();
        let user = fx.user().await;

        // T1: login.
        fx.clock.advance(Duration::seconds(10));
        let token_a = fx.sessions.login("u@x.com", "Secret123!").await.unwrap().token;
        let carrier_a = CredentialCarrier::bearer(&token_a);
        assert_eq!(fx.guard.authenticate(&carrier_a).await.unwrap().user_id, user.id);

        // T2: password change.
        fx.clock.advance(Duration::seconds(10));
        let identity = fx.guard.authenticate(&carrier_a).await.unwrap();
        let token_c = fx
            .sessions
            .change_password(&identity, "Secret123!", "NewPass1!", "NewPass1!")
            .await
            .unwrap()
            .token;
        assert!(matches!(
            fx.guard.authenticate(&carrier_a).await,
            Err(AuthError::StalePassword)
        ));
        assert!(fx.guard.authenticate(&CredentialCarrier::bearer(&token_c)).await.is_ok());

        // T3: fresh login with the new password.
        fx.clock.advance(Duration::seconds(10));
        let token_b = fx.sessions.login("u@x.com", "NewPass1!").await.unwrap().token;
        let identity = fx
            .guard
            .authenticate(&CredentialCarrier::bearer(&token_b))
            .await
            .unwrap();
        assert_eq!(identity.user_id, user.id);
    }

    #[tokio::test]
    async fn test_deactivate_invalidates_sessions() {
        let fx = Fixture::new();
        let user = fx.user().await;
        let token = fx.sessions.login("u@x.com", "Secret123!").await.unwrap().token;

        fx.sessions.deactivate(user.id).await.unwrap();
        assert!(matches!(
            fx.guard.authenticate(&CredentialCarrier::cookie(&token)).await,
            Err(AuthError::UserNotFound)
        ));

        let err = fx.sessions.deactivate(user.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_debug_redacts_token() {
        let fx = Fixture::new();
        fx.user().await;
        let grant = fx.sessions.login("u@x.com", "Secret123!").await.unwrap();
        assert!(!format!("{grant:?}").contains(&grant.token));
    }
}
