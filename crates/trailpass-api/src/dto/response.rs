//! Response envelopes.

use serde::Serialize;
use uuid::Uuid;

use trailpass_auth::guard::Identity;
use trailpass_entity::user::{User, UserRole};

/// Success envelope: `{"status": "success", "token"?, "data"?, "message"?}`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Always `success`.
    pub status: &'static str,
    /// Session token, on responses that start a session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human-readable note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    /// A success response carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            status: "success",
            token: None,
            data: Some(data),
            message: None,
        }
    }

    /// A success response that hands out a session token.
    pub fn with_token(token: String, data: T) -> Self {
        Self {
            token: Some(token),
            ..Self::ok(data)
        }
    }
}

impl ApiResponse<()> {
    /// A success response with only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            token: None,
            data: None,
            message: Some(message.into()),
        }
    }

    /// A bare `{"status": "success"}`.
    pub fn empty() -> Self {
        Self {
            status: "success",
            token: None,
            data: None,
            message: None,
        }
    }
}

/// `{"user": ...}` payload.
#[derive(Debug, Clone, Serialize)]
pub struct UserData {
    /// The user, or `null` for anonymous callers.
    pub user: Option<UserResponse>,
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    /// User ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Role.
    pub role: UserRole,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

impl From<Identity> for UserResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.user_id,
            name: identity.name,
            email: identity.email,
            role: identity.role,
        }
    }
}

impl UserData {
    /// Wraps a user.
    pub fn of(user: impl Into<UserResponse>) -> Self {
        Self {
            user: Some(user.into()),
        }
    }
}
