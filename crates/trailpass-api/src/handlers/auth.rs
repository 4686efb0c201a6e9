//! Auth handlers: signup, login, logout, password reset and change, and
//! the caller's own identity.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use trailpass_auth::session::{SessionGrant, SignupRequest as NewAccount};
use trailpass_entity::user::UserRole;

use crate::dto::request::{
    ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, SignupRequest,
    UpdatePasswordRequest, validate_body,
};
use crate::dto::response::{ApiResponse, UserData};
use crate::error::ApiError;
use crate::extractors::{AuthUser, MaybeAuthUser};
use crate::middleware::rbac::require_roles;
use crate::state::AppState;

/// Sets the session cookie and renders `{status, token, data: {user}}`.
fn session_response(state: &AppState, status: StatusCode, grant: SessionGrant) -> Response {
    let cookie = state.cookie.issue(&grant.token);
    let body = ApiResponse::with_token(grant.token, UserData::of(&grant.user));
    (status, [(header::SET_COOKIE, cookie)], Json(body)).into_response()
}

/// POST /api/v1/users/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<Response, ApiError> {
    validate_body(&req)?;

    let grant = state
        .sessions
        .signup(NewAccount {
            name: req.name,
            email: req.email,
            password: req.password,
            password_confirm: req.password_confirm,
        })
        .await?;

    Ok(session_response(&state, StatusCode::CREATED, grant))
}

/// POST /api/v1/users/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    validate_body(&req)?;
    let grant = state.sessions.login(&req.email, &req.password).await?;
    Ok(session_response(&state, StatusCode::OK, grant))
}

/// GET /api/v1/users/logout
pub async fn logout(State(state): State<AppState>) -> Response {
    (
        [(header::SET_COOKIE, state.cookie.cleared())],
        Json(ApiResponse::empty()),
    )
        .into_response()
}

/// POST /api/v1/users/forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    validate_body(&req)?;
    state.resets.request_and_deliver(&req.email).await?;
    Ok(Json(ApiResponse::message("Token sent to email!")))
}

/// PATCH /api/v1/users/reset-password/{token}
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Response, ApiError> {
    validate_body(&req)?;
    let grant = state.resets.consume_reset(&token, &req.password).await?;
    Ok(session_response(&state, StatusCode::OK, grant))
}

/// PATCH /api/v1/users/update-my-password
pub async fn update_my_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<Response, ApiError> {
    validate_body(&req)?;
    let grant = state
        .sessions
        .change_password(&auth, &req.password_current, &req.password, &req.password_confirm)
        .await?;
    Ok(session_response(&state, StatusCode::OK, grant))
}

/// GET /api/v1/users/me
pub async fn me(auth: AuthUser) -> Json<ApiResponse<UserData>> {
    Json(ApiResponse::ok(UserData::of(auth.0)))
}

/// GET /api/v1/users/session
///
/// Soft authentication: anonymous callers get `{"user": null}`.
pub async fn session(MaybeAuthUser(identity): MaybeAuthUser) -> Json<ApiResponse<UserData>> {
    Json(ApiResponse::ok(UserData {
        user: identity.map(Into::into),
    }))
}

/// DELETE /api/v1/users/delete-me
pub async fn delete_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Response, ApiError> {
    state.sessions.deactivate(auth.user_id).await?;
    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, state.cookie.cleared())],
    )
        .into_response())
}

/// DELETE /api/v1/users/{id}
///
/// Admin only.
pub async fn deactivate_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_roles(&auth, &[UserRole::Admin])?;
    state.sessions.deactivate(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
