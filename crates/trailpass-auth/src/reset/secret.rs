//! Reset secret generation and digesting.

use std::fmt;

use sha2::{Digest, Sha256};

/// Number of random bytes in a reset secret.
const SECRET_BYTES: usize = 32;

/// The plaintext reset token.
///
/// Exists only between generation and hand-off to the notifier. It is not
/// `Clone`, and its `Debug` output never contains the value.
pub struct ResetSecret(String);

impl ResetSecret {
    /// Draws 256 random bits and hex-encodes them.
    pub fn generate() -> Self {
        Self(hex::encode(rand::random::<[u8; SECRET_BYTES]>()))
    }

    /// The plaintext, for embedding in the outbound message.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// The digest that is persisted in place of the plaintext.
    pub fn digest(&self) -> String {
        digest_token(&self.0)
    }
}

impl fmt::Debug for ResetSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResetSecret(<redacted>)")
    }
}

/// Hex-encoded SHA-256 of a presented reset token.
pub fn digest_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
