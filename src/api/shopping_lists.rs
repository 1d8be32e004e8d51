//! Shopping list endpoints.

use axum::{
    extract::{Path, State},
    Extension,
};

use super::extract::Json;
use super::{success, ApiResult, Deleted};
use crate::auth::CurrentUser;
use crate::models::{
    CreateShoppingListRequest, ShoppingList, ShoppingListDetail, UpdateShoppingListRequest,
};
use crate::AppState;

/// GET /api/shopping-lists - Lists with item and purchased counts.
pub async fn list_shopping_lists(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Vec<ShoppingList>> {
    success(state.repo.list_shopping_lists(&user.id).await?)
}

/// GET /api/shopping-lists/:id - A list with its items.
pub async fn get_shopping_list(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<ShoppingListDetail> {
    success(state.repo.get_shopping_list_detail(&user.id, &id).await?)
}

/// POST /api/shopping-lists
pub async fn create_shopping_list(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<CreateShoppingListRequest>,
) -> ApiResult<ShoppingList> {
    request.validate()?;
    success(state.repo.create_shopping_list(&user.id, &request).await?)
}

/// PATCH /api/shopping-lists/:id - Rename, annotate or move the list forward.
pub async fn update_shopping_list(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateShoppingListRequest>,
) -> ApiResult<ShoppingList> {
    request.validate()?;
    success(state.repo.update_shopping_list(&user.id, &id, &request).await?)
}

/// DELETE /api/shopping-lists/:id
pub async fn delete_shopping_list(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    state.repo.delete_shopping_list(&user.id, &id).await?;
    success(Deleted { deleted: true })
}
