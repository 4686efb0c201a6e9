//! Session cookie policy.

use std::sync::Arc;

use chrono::Duration;
use cookie::time::{Duration as CookieDuration, OffsetDateTime};
use cookie::{Cookie, SameSite};

use trailpass_core::clock::Clock;
use trailpass_core::config::{AuthConfig, Environment};

/// Name of the cookie that carries the session token.
pub const SESSION_COOKIE: &str = "jwt";

/// Placeholder value written on logout.
pub const LOGGED_OUT: &str = "loggedout";

/// Lifetime of the logout placeholder, in seconds.
const LOGOUT_TTL_SECONDS: i64 = 10;

/// Upper bound on the configured cookie lifetime.
const MAX_COOKIE_TTL_DAYS: u64 = 36_500;

/// Builds `Set-Cookie` values for the session cookie.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    secure: bool,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl SessionCookie {
    /// Creates the policy. `Secure` is set only in production.
    pub fn new(config: &AuthConfig, environment: Environment, clock: Arc<dyn Clock>) -> Self {
        let days = config.cookie_ttl_days.min(MAX_COOKIE_TTL_DAYS) as i64;
        Self {
            secure: environment.is_production(),
            ttl: Duration::days(days),
            clock,
        }
    }

    /// Cookie that stores `token` for the configured cookie lifetime.
    pub fn issue(&self, token: &str) -> String {
        self.render(token, self.ttl)
    }

    /// Cookie that overwrites the session with a short-lived placeholder.
    pub fn cleared(&self) -> String {
        self.render(LOGGED_OUT, Duration::seconds(LOGOUT_TTL_SECONDS))
    }

    fn render(&self, value: &str, ttl: Duration) -> String {
        let expires = self
            .clock
            .now()
            .checked_add_signed(ttl)
            .and_then(|at| OffsetDateTime::from_unix_timestamp(at.timestamp()).ok());

        Cookie::build((SESSION_COOKIE, value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(CookieDuration::seconds(ttl.num_seconds()))
            .expires(expires)
            .build()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{SECRET, start_clock};

    fn policy(environment: Environment) -> SessionCookie {
        SessionCookie::new(
            &AuthConfig::with_secret(SECRET),
            environment,
            Arc::new(start_clock()),
        )
    }

    #[test]
    fn test_issue_development() {
        let cookie = policy(Environment::Development).issue("abc.def.ghi");
        assert_eq!(
            cookie,
            "jwt=abc.def.ghi; HttpOnly; SameSite=Lax; Path=/; Max-Age=7776000; \
             Expires=Sun, 31 Mar 2024 00:00:00 GMT"
        );
    }

    #[test]
    fn test_issue_production_is_secure() {
        let cookie = policy(Environment::Production).issue("abc.def.ghi");
        assert!(cookie.contains("; Secure"));
        assert!(cookie.contains("HttpOnly"));

        let parsed = Cookie::parse(cookie).unwrap();
        assert_eq!(parsed.name(), SESSION_COOKIE);
        assert_eq!(parsed.value(), "abc.def.ghi");
        assert_eq!(parsed.secure(), Some(true));
        assert_eq!(parsed.same_site(), Some(SameSite::Lax));
    }

    #[test]
    fn test_cleared() {
        let cookie = policy(Environment::Development).cleared();
        assert!(cookie.starts_with("jwt=loggedout; "));
        assert!(cookie.contains("; Max-Age=10;"));
        assert!(!cookie.contains("Secure"));
        assert!(cookie.contains("Expires=Mon, 01 Jan 2024 00:00:10 GMT"));
    }
}
