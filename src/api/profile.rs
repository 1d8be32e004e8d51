//! Household profile endpoints.

use axum::{extract::State, Extension};

use super::extract::Json;
use super::{success, ApiResult};
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::{Profile, UpdateProfileRequest};
use crate::AppState;

/// GET /api/profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Profile> {
    let profile = state
        .repo
        .get_profile(&user.id)
        .await?
        .ok_or_else(|| AppError::not_found("Profile", &user.id))?;
    success(profile)
}

/// PUT /api/profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> ApiResult<Profile> {
    request.validate()?;
    success(state.repo.update_profile(&user.id, &request).await?)
}
