//! Converting purchased items into inventory.

use axum::{
    extract::{Path, State},
    Extension,
};

use super::extract::Json;
use super::{success, ApiResult};
use crate::auth::CurrentUser;
use crate::db::today;
use crate::models::{ConvertPreviewItem, ConvertResult, ConvertToInventoryRequest};
use crate::AppState;

/// GET /api/shopping-lists/:id/convert-to-inventory - What each purchased item would do.
pub async fn convert_preview(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(list_id): Path<String>,
) -> ApiResult<Vec<ConvertPreviewItem>> {
    success(state.repo.convert_preview(&user.id, &list_id).await?)
}

/// POST /api/shopping-lists/:id/convert-to-inventory
pub async fn convert_to_inventory(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(list_id): Path<String>,
    Json(request): Json<ConvertToInventoryRequest>,
) -> ApiResult<ConvertResult> {
    success(
        state
            .repo
            .convert_to_inventory(&user.id, &list_id, &request, today())
            .await?,
    )
}
