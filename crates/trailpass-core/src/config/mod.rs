//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! TOML files and `TRAILPASS__`-prefixed environment variables. The result
//! is validated once at startup and then shared immutably.

pub mod app;
pub mod auth;
pub mod database;
pub mod logging;

use serde::Deserialize;

pub use self::app::{Environment, ServerConfig};
pub use self::auth::{Argon2Config, AuthConfig, MIN_SECRET_LENGTH};
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Deployment mode.
    #[serde(default)]
    pub environment: Environment,
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Authentication settings.
    pub auth: AuthConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files and the environment.
    ///
    /// Merges `config/default.toml`, the environment overlay
    /// `config/{env}.toml`, and environment variables prefixed with
    /// `TRAILPASS__` (e.g. `TRAILPASS__AUTH__JWT_SECRET`). The merged result
    /// is validated before it is returned.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = ::config::Config::builder()
            .set_default("environment", env)?
            .add_source(::config::File::with_name("config/default").required(false))
            .add_source(::config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                ::config::Environment::with_prefix("TRAILPASS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Checks invariants that deserialization alone cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        let auth = &self.auth;

        if auth.jwt_secret.is_empty() {
            return Err(AppError::configuration(
                "auth.jwt_secret is not set; refusing to start without a signing secret",
            ));
        }
        if auth.jwt_secret.len() < auth::MIN_SECRET_LENGTH {
            return Err(AppError::configuration(format!(
                "auth.jwt_secret must be at least {} bytes",
                auth::MIN_SECRET_LENGTH
            )));
        }
        if auth.token_ttl_minutes == 0 {
            return Err(AppError::configuration(
                "auth.token_ttl_minutes must be greater than zero",
            ));
        }
        if auth.reset_token_ttl_minutes == 0 {
            return Err(AppError::configuration(
                "auth.reset_token_ttl_minutes must be greater than zero",
            ));
        }
        if auth.max_concurrent_hashes == 0 {
            return Err(AppError::configuration(
                "auth.max_concurrent_hashes must be greater than zero",
            ));
        }
        if self.environment.is_production() && self.database.url.is_none() {
            return Err(AppError::configuration(
                "database.url is required in production",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_secret(secret: &str) -> AppConfig {
        AppConfig {
            environment: Environment::Development,
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::with_secret(secret),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_missing_secret_is_fatal() {
        let err = config_with_secret("").validate().unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
    }

    #[test]
    fn test_short_secret_is_rejected() {
        assert!(config_with_secret("too-short").validate().is_err());
    }

    #[test]
    fn test_valid_development_config() {
        let config = config_with_secret("0123456789abcdef0123456789abcdef");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_requires_database() {
        let mut config = config_with_secret("0123456789abcdef0123456789abcdef");
        config.environment = Environment::Production;
        assert!(config.validate().is_err());

        config.database.url = Some("postgres://localhost/trailpass".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = config_with_secret("0123456789abcdef0123456789abcdef");
        let rendered = format!("{:?}", config.auth);
        assert!(!rendered.contains("0123456789abcdef"));
    }

    #[test]
    fn test_committed_files_carry_no_secret() {
        let files = [
            include_str!("../../../../config/default.toml"),
            include_str!("../../../../config/development.toml"),
            include_str!("../../../../config/production.toml"),
        ];
        for contents in files {
            let parsed = ::config::Config::builder()
                .add_source(::config::File::from_str(contents, ::config::FileFormat::Toml))
                .build()
                .unwrap();
            assert!(parsed.get_string("auth.jwt_secret").is_err());
        }
    }
}
