//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use chrono::DateTime;
use serde_json::Value;
use tower::ServiceExt;

use trailpass_api::{AppState, build_router};
use trailpass_auth::notifier::Notifier;
use trailpass_auth::password::PasswordHasher;
use trailpass_auth::reset::ResetSecret;
use trailpass_core::clock::ManualClock;
use trailpass_core::config::{
    AppConfig, Argon2Config, AuthConfig, DatabaseConfig, Environment, LoggingConfig, ServerConfig,
};
use trailpass_core::error::AppError;
use trailpass_core::result::AppResult;
use trailpass_database::MemoryUserStore;
use trailpass_database::store::UserStore;
use trailpass_entity::user::{NewUser, User, UserRole};

/// Notifier that keeps reset tokens so tests can follow the link.
#[derive(Debug, Default)]
pub struct InboxNotifier {
    resets: Mutex<Vec<(String, String)>>,
    fail: Mutex<bool>,
}

impl InboxNotifier {
    /// Latest reset token sent to `email`.
    pub fn last_reset_for(&self, email: &str) -> Option<String> {
        self.resets
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, token)| token.clone())
    }

    /// Makes every subsequent send fail.
    pub fn break_relay(&self) {
        *self.fail.lock().unwrap() = true;
    }
}

#[async_trait]
impl Notifier for InboxNotifier {
    async fn send_password_reset(&self, user: &User, secret: &ResetSecret) -> AppResult<()> {
        if *self.fail.lock().unwrap() {
            return Err(AppError::external_service("relay down"));
        }
        self.resets
            .lock()
            .unwrap()
            .push((user.email.clone(), secret.expose().to_string()));
        Ok(())
    }

    async fn send_welcome(&self, _user: &User) -> AppResult<()> {
        Ok(())
    }
}

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Backing store for direct setup
    pub store: Arc<MemoryUserStore>,
    /// Shared manual clock
    pub clock: ManualClock,
    /// Captured outbound messages
    pub inbox: Arc<InboxNotifier>,
    /// Hasher with the app's cost settings
    pub hasher: PasswordHasher,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// The `Set-Cookie` header, if any.
    pub fn set_cookie(&self) -> Option<&str> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
    }

    /// The `token` field of a session response.
    pub fn token(&self) -> String {
        self.body["token"].as_str().expect("token in body").to_string()
    }
}

impl TestApp {
    /// Create a new test application in the given environment.
    pub fn with_environment(environment: Environment) -> Self {
        let mut auth = AuthConfig::with_secret("integration-test-secret-32-bytes-min");
        auth.argon2 = Argon2Config {
            memory_kib: 256,
            iterations: 1,
            parallelism: 1,
        };
        let hasher = PasswordHasher::new(&auth).expect("Failed to build hasher");
        let config = AppConfig {
            environment,
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth,
            logging: LoggingConfig::default(),
        };

        let clock = ManualClock::new(DateTime::from_timestamp(1_704_067_200, 0).unwrap());
        let store = Arc::new(MemoryUserStore::with_clock(Arc::new(clock.clone())));
        let inbox = Arc::new(InboxNotifier::default());

        let state = AppState::build(
            config,
            store.clone(),
            inbox.clone(),
            Arc::new(clock.clone()),
        )
        .expect("Failed to build state");

        Self {
            router: build_router(state),
            store,
            clock,
            inbox,
            hasher,
        }
    }

    /// Create a new development-mode test application.
    pub fn new() -> Self {
        Self::with_environment(Environment::Development)
    }

    /// Sign up a user through the API and return the session token.
    pub async fn signup(&self, email: &str, password: &str) -> String {
        let response = self
            .request(
                "POST",
                "/api/v1/users/signup",
                Some(serde_json::json!({
                    "name": "Trail Hiker",
                    "email": email,
                    "password": password,
                    "passwordConfirm": password,
                })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.token()
    }

    /// Insert a user directly into the store.
    pub async fn create_user(&self, email: &str, password: &str, role: UserRole) -> User {
        let password_hash = self.hasher.hash_password(password).await.unwrap();
        self.store
            .create(&NewUser {
                name: "Trail Hiker".to_string(),
                email: email.to_string(),
                password_hash,
                role,
            })
            .await
            .unwrap()
    }

    /// Log in through the API and return the session token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .request(
                "POST",
                "/api/v1/users/login",
                Some(serde_json::json!({ "email": email, "password": password })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.token()
    }

    /// Send a request with an optional bearer token.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(req, body).await
    }

    /// Send a request carrying the session cookie.
    pub async fn request_with_cookie(&self, method: &str, path: &str, cookie: &str) -> TestResponse {
        let req = Request::builder()
            .method(method)
            .uri(path)
            .header(header::COOKIE, cookie);
        self.send(req, None).await
    }

    async fn send(&self, req: axum::http::request::Builder, body: Option<Value>) -> TestResponse {
        let body = body
            .map(|b| Body::from(serde_json::to_vec(&b).expect("Failed to serialize body")))
            .unwrap_or_else(Body::empty);
        let req = req.body(body).expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

