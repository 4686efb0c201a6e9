//! Authentication extractors: adapters from request parts to the access
//! guard.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;

use trailpass_auth::cookie::SESSION_COOKIE;
use trailpass_auth::guard::{CredentialCarrier, Identity};

use crate::error::ApiError;
use crate::state::AppState;

/// Collects the `Authorization` header and the session cookie.
pub fn carrier_from_parts(parts: &Parts) -> CredentialCarrier {
    let authorization = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let cookie = CookieJar::from_headers(&parts.headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string());

    CredentialCarrier {
        authorization,
        cookie,
    }
}

/// An authenticated caller. Rejects with 401 when authentication fails.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl std::ops::Deref for AuthUser {
    type Target = Identity;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let carrier = carrier_from_parts(parts);
        let identity = state.guard.authenticate(&carrier).await?;
        Ok(AuthUser(identity))
    }
}

/// A caller who may or may not be logged in. Never rejects.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<Identity>);

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let carrier = carrier_from_parts(parts);
        Ok(MaybeAuthUser(state.guard.try_authenticate(&carrier).await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_carrier_reads_header_and_cookie() {
        let parts = parts(
            Request::builder()
                .header(header::AUTHORIZATION, "Bearer header-token")
                .header(header::COOKIE, "theme=dark; jwt=cookie-token"),
        );
        let carrier = carrier_from_parts(&parts);
        assert_eq!(carrier.authorization.as_deref(), Some("Bearer header-token"));
        assert_eq!(carrier.cookie.as_deref(), Some("cookie-token"));
        assert_eq!(carrier.token(), Some("header-token"));
    }

    #[test]
    fn test_carrier_without_credentials() {
        let carrier = carrier_from_parts(&parts(Request::builder()));
        assert!(carrier.token().is_none());
    }
}
