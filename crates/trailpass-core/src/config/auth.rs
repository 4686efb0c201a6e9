//! Authentication configuration.

use serde::Deserialize;

/// Minimum accepted length, in bytes, of the token signing secret.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Authentication and credential configuration.
///
/// The signing secret has no default: a deployment that does not provide
/// one fails at startup.
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    /// Symmetric secret for session-token signing (HMAC-SHA256).
    #[serde(default)]
    pub jwt_secret: String,
    /// Session token lifetime in minutes.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_minutes: u64,
    /// Session cookie lifetime in days. May outlive the token itself.
    #[serde(default = "default_cookie_ttl")]
    pub cookie_ttl_days: u64,
    /// Password-reset token lifetime in minutes.
    #[serde(default = "default_reset_ttl")]
    pub reset_token_ttl_minutes: u64,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Argon2id cost parameters.
    #[serde(default)]
    pub argon2: Argon2Config,
    /// Maximum number of password hashes computed at once.
    #[serde(default = "default_max_concurrent_hashes")]
    pub max_concurrent_hashes: usize,
    /// Upper bound on a single user lookup performed by the access guard.
    #[serde(default = "default_lookup_timeout")]
    pub lookup_timeout_ms: u64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("cookie_ttl_days", &self.cookie_ttl_days)
            .field("reset_token_ttl_minutes", &self.reset_token_ttl_minutes)
            .field("password_min_length", &self.password_min_length)
            .field("argon2", &self.argon2)
            .field("max_concurrent_hashes", &self.max_concurrent_hashes)
            .field("lookup_timeout_ms", &self.lookup_timeout_ms)
            .finish()
    }
}

impl AuthConfig {
    /// Builds a configuration with the given secret and default settings.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: secret.into(),
            token_ttl_minutes: default_token_ttl(),
            cookie_ttl_days: default_cookie_ttl(),
            reset_token_ttl_minutes: default_reset_ttl(),
            password_min_length: default_password_min(),
            argon2: Argon2Config::default(),
            max_concurrent_hashes: default_max_concurrent_hashes(),
            lookup_timeout_ms: default_lookup_timeout(),
        }
    }
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct Argon2Config {
    /// Memory cost in KiB.
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    /// Number of passes.
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    /// Degree of parallelism.
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

impl Default for Argon2Config {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

fn default_token_ttl() -> u64 {
    // 90 days
    129_600
}

fn default_cookie_ttl() -> u64 {
    90
}

fn default_reset_ttl() -> u64 {
    10
}

fn default_password_min() -> usize {
    8
}

fn default_max_concurrent_hashes() -> usize {
    4
}

fn default_lookup_timeout() -> u64 {
    5_000
}

fn default_memory_kib() -> u32 {
    19_456
}

fn default_iterations() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}
