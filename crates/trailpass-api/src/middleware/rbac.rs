//! Role-based route guarding.

use trailpass_auth::guard::access::authorize;
use trailpass_entity::user::UserRole;

use crate::error::ApiError;
use crate::extractors::AuthUser;

/// Fails with 403 unless the caller's role is one of `allowed`.
pub fn require_roles(auth: &AuthUser, allowed: &[UserRole]) -> Result<(), ApiError> {
    authorize(auth, allowed).map_err(ApiError::from)
}
