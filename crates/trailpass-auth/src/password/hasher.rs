//! Argon2id password hashing and verification.
//!
//! Argon2 is deliberately slow, so both directions run on the blocking pool
//! and are admitted through a semaphore sized by
//! `auth.max_concurrent_hashes`.

use std::sync::Arc;

use argon2::password_hash::{
    PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use tokio::sync::Semaphore;

use trailpass_core::config::{Argon2Config, AuthConfig};
use trailpass_core::error::{AppError, ErrorKind};
use trailpass_core::result::AppResult;

/// Handles password hashing and verification using Argon2id.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    /// Validated cost parameters.
    params: Params,
    /// Admission control for concurrent hash computations.
    permits: Arc<Semaphore>,
}

impl PasswordHasher {
    /// Creates a hasher from auth configuration.
    pub fn new(config: &AuthConfig) -> AppResult<Self> {
        Ok(Self {
            params: build_params(&config.argon2)?,
            permits: Arc::new(Semaphore::new(config.max_concurrent_hashes.max(1))),
        })
    }

    fn argon2(params: Params) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    }

    /// Hashes a plaintext password with a random salt, returning a PHC string.
    pub async fn hash_password(&self, password: &str) -> AppResult<String> {
        let _permit = self.acquire().await?;
        let params = self.params.clone();
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || {
            let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
                .map_err(|e| AppError::internal(format!("Salt generation failed: {e}")))?;
            Self::argon2(params)
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
        })
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Hashing task failed", e))?
    }

    /// Verifies a plaintext password against a stored hash.
    ///
    /// Returns `Ok(false)` on mismatch. A hash that cannot be parsed is an
    /// internal error, never a mismatch.
    pub async fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        let _permit = self.acquire().await?;
        let params = self.params.clone();
        let password = password.to_owned();
        let hash = hash.to_owned();

        tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&hash)
                .map_err(|e| AppError::internal(format!("Invalid password hash format: {e}")))?;
            match Self::argon2(params).verify_password(password.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(e) => Err(AppError::internal(format!(
                    "Password verification failed: {e}"
                ))),
            }
        })
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Verification task failed", e))?
    }

    async fn acquire(&self) -> AppResult<tokio::sync::SemaphorePermit<'_>> {
        self.permits
            .acquire()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Hasher is shut down", e))
    }
}

fn build_params(config: &Argon2Config) -> AppResult<Params> {
    Params::new(config.memory_kib, config.iterations, config.parallelism, None)
        .map_err(|e| AppError::configuration(format!("Invalid Argon2 parameters: {e}")))
}
