//! Outbound message seam.
//!
//! The credential core decides *that* a user must be told something; how
//! the message travels is up to the implementation.

use async_trait::async_trait;
use tracing::info;

use trailpass_core::result::AppResult;
use trailpass_entity::user::User;

use crate::reset::ResetSecret;

/// Delivers account messages to a user's registered address.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Sends the reset link carrying `secret`.
    ///
    /// An `Err` means the message did not leave; the caller rolls back the
    /// pending reset.
    async fn send_password_reset(&self, user: &User, secret: &ResetSecret) -> AppResult<()>;

    /// Sends the post-signup welcome message.
    async fn send_welcome(&self, user: &User) -> AppResult<()>;
}

/// Notifier that only records dispatch in the log.
///
/// Used in development and whenever no mail transport is configured. The
/// reset link is assembled but never written anywhere.
#[derive(Debug, Clone)]
pub struct TracingNotifier {
    public_url: String,
}

impl TracingNotifier {
    /// Creates a notifier that links to `public_url`.
    pub fn new(public_url: impl Into<String>) -> Self {
        Self {
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// The link a user follows to redeem `secret`.
    pub fn reset_url(&self, secret: &ResetSecret) -> String {
        format!(
            "{}/api/v1/users/reset-password/{}",
            self.public_url,
            secret.expose()
        )
    }
}

#[async_trait]
impl Notifier for TracingNotifier {
    async fn send_password_reset(&self, user: &User, secret: &ResetSecret) -> AppResult<()> {
        let link = self.reset_url(secret);
        info!(
            user_id = %user.id,
            recipient = %user.email,
            link_length = link.len(),
            "Password reset message dispatched"
        );
        Ok(())
    }

    async fn send_welcome(&self, user: &User) -> AppResult<()> {
        info!(user_id = %user.id, recipient = %user.email, "Welcome message dispatched");
        Ok(())
    }
}
