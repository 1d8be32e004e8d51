//! Inventory endpoints.

use axum::{
    extract::{Path, State},
    Extension,
};

use super::extract::{Json, Query};
use super::{success, ApiResult, Deleted};
use crate::auth::CurrentUser;
use crate::db::today;
use crate::errors::AppError;
use crate::models::{
    CreateInventoryItemRequest, ExpiringQuery, InventoryItem, UpdateInventoryItemRequest,
};
use crate::AppState;

/// GET /api/inventory
pub async fn list_inventory(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Vec<InventoryItem>> {
    success(state.repo.list_inventory(&user.id).await?)
}

/// GET /api/inventory/expiring?days= - Items expiring within `days` (default 3).
pub async fn list_expiring_inventory(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<ExpiringQuery>,
) -> ApiResult<Vec<InventoryItem>> {
    if !(0..=365).contains(&query.days) {
        return Err(AppError::Validation(
            "days must be between 0 and 365".to_string(),
        ));
    }
    success(
        state
            .repo
            .expiring_inventory(&user.id, today(), query.days)
            .await?,
    )
}

/// GET /api/inventory/:id
pub async fn get_inventory_item(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<InventoryItem> {
    success(state.repo.get_inventory_item(&user.id, &id).await?)
}

/// POST /api/inventory
pub async fn create_inventory_item(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<CreateInventoryItemRequest>,
) -> ApiResult<InventoryItem> {
    request.validate()?;
    success(state.repo.create_inventory_item(&user.id, &request).await?)
}

/// PUT /api/inventory/:id
pub async fn update_inventory_item(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateInventoryItemRequest>,
) -> ApiResult<InventoryItem> {
    request.validate()?;
    success(state.repo.update_inventory_item(&user.id, &id, &request).await?)
}

/// DELETE /api/inventory/:id
pub async fn delete_inventory_item(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    state.repo.delete_inventory_item(&user.id, &id).await?;
    success(Deleted { deleted: true })
}
