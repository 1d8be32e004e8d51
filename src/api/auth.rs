//! Registration, login and logout endpoints.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Extension,
};

use super::extract::Json;
use super::{success, ApiResponse, ApiResult, Deleted};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::{clear_session_cookie, end_session, start_session, CurrentUser};
use crate::errors::AppError;
use crate::models::{LoginRequest, RegisterRequest, User};
use crate::AppState;

/// POST /api/auth/register - Create an account and sign it in.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Response, AppError> {
    request.validate()?;

    let password_hash = hash_password(&request.password)?;
    let user = state
        .repo
        .create_user(&request.email, &request.name, &password_hash)
        .await?;
    tracing::info!(user_id = %user.id, "User registered");

    let cookie = start_session(&state, &user.id).await?;
    Ok(([(header::SET_COOKIE, cookie)], ApiResponse::new(user)).into_response())
}

/// POST /api/auth/login - Start a session for valid credentials.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, AppError> {
    request.validate()?;

    let invalid = || AppError::Validation("Invalid email or password".to_string());
    let (user, password_hash) = state
        .repo
        .find_credentials(&request.email)
        .await?
        .ok_or_else(invalid)?;
    if !verify_password(&request.password, &password_hash) {
        tracing::warn!(user_id = %user.id, "Failed login attempt");
        return Err(invalid());
    }

    let cookie = start_session(&state, &user.id).await?;
    Ok(([(header::SET_COOKIE, cookie)], ApiResponse::new(user)).into_response())
}

/// POST /api/auth/logout - End the current session, if any.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    end_session(&state, &headers).await?;
    let cookie = clear_session_cookie(state.config.cookie_secure);
    Ok(([(header::SET_COOKIE, cookie)], ApiResponse::new(Deleted { deleted: true })).into_response())
}

/// GET /api/auth/me - The signed-in user.
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> ApiResult<User> {
    success(user)
}
