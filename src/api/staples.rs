//! Recurring staple endpoints.

use axum::{
    extract::{Path, State},
    Extension,
};

use super::extract::Json;
use super::{success, ApiResult, Deleted};
use crate::auth::CurrentUser;
use crate::db::today;
use crate::grocery::staples::with_due;
use crate::models::{CreateStapleRequest, StapleWithDue, UpdateStapleRequest};
use crate::AppState;

/// GET /api/staples - Every staple with its due status.
pub async fn list_staples(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Vec<StapleWithDue>> {
    let today = today();
    let staples = state.repo.list_staples(&user.id).await?;
    success(staples.into_iter().map(|s| with_due(s, today)).collect())
}

/// GET /api/staples/due - Active staples that should be bought now.
pub async fn list_due_staples(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Vec<StapleWithDue>> {
    success(state.repo.due_staples(&user.id, today()).await?)
}

/// GET /api/staples/:id
pub async fn get_staple(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<StapleWithDue> {
    let staple = state.repo.get_staple(&user.id, &id).await?;
    success(with_due(staple, today()))
}

/// POST /api/staples
pub async fn create_staple(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<CreateStapleRequest>,
) -> ApiResult<StapleWithDue> {
    request.validate()?;
    let staple = state.repo.create_staple(&user.id, &request).await?;
    success(with_due(staple, today()))
}

/// PUT /api/staples/:id
pub async fn update_staple(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateStapleRequest>,
) -> ApiResult<StapleWithDue> {
    request.validate()?;
    let staple = state.repo.update_staple(&user.id, &id, &request).await?;
    success(with_due(staple, today()))
}

/// DELETE /api/staples/:id
pub async fn delete_staple(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    state.repo.delete_staple(&user.id, &id).await?;
    success(Deleted { deleted: true })
}
