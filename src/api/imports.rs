//! Staple and meal-plan imports, and excluded lines.

use axum::{
    extract::{Path, State},
    Extension,
};

use super::extract::{Json, Query};
use super::{success, ApiResult};
use crate::auth::CurrentUser;
use crate::db::today;
use crate::errors::AppError;
use crate::grocery::aggregate::MealPlanImportPreview;
use crate::models::{
    AddBackRequest, ExcludedItem, MealPlanImportQuery, MealPlanImportRequest,
    MealPlanImportResult, ShoppingListItem, StapleImportCandidate, StapleImportRequest,
    StapleImportResult,
};
use crate::AppState;

// ==================== STAPLES ====================

/// GET /api/shopping-lists/:id/import/staples - Active staples with pre-selection.
pub async fn staple_import_candidates(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(list_id): Path<String>,
) -> ApiResult<Vec<StapleImportCandidate>> {
    success(
        state
            .repo
            .staple_import_candidates(&user.id, &list_id, today())
            .await?,
    )
}

/// POST /api/shopping-lists/:id/import/staples
pub async fn import_staples(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(list_id): Path<String>,
    Json(request): Json<StapleImportRequest>,
) -> ApiResult<StapleImportResult> {
    if request.staple_ids.is_empty() {
        return Err(AppError::Validation(
            "stapleIds must not be empty".to_string(),
        ));
    }
    success(
        state
            .repo
            .import_staples(&user.id, &list_id, &request.staple_ids)
            .await?,
    )
}

// ==================== MEAL PLANS ====================

/// GET /api/shopping-lists/:id/import/meal-plan?mealPlanId=&checkInventory=
pub async fn meal_plan_import_preview(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(list_id): Path<String>,
    Query(query): Query<MealPlanImportQuery>,
) -> ApiResult<MealPlanImportPreview> {
    success(
        state
            .repo
            .meal_plan_import_preview(&user.id, &list_id, &query.meal_plan_id, query.check_inventory)
            .await?,
    )
}

/// POST /api/shopping-lists/:id/import/meal-plan
pub async fn import_meal_plan(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(list_id): Path<String>,
    Json(request): Json<MealPlanImportRequest>,
) -> ApiResult<MealPlanImportResult> {
    if request.meal_plan_id.trim().is_empty() {
        return Err(AppError::Validation("mealPlanId is required".to_string()));
    }
    success(state.repo.import_meal_plan(&user.id, &list_id, &request).await?)
}

// ==================== EXCLUDED ITEMS ====================

/// GET /api/shopping-lists/:id/excluded-items
pub async fn list_excluded_items(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(list_id): Path<String>,
) -> ApiResult<Vec<ExcludedItem>> {
    success(state.repo.list_excluded_items(&user.id, &list_id).await?)
}

/// POST /api/shopping-lists/:id/excluded-items - Put an excluded line back on the list.
pub async fn add_back_excluded_item(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(list_id): Path<String>,
    Json(request): Json<AddBackRequest>,
) -> ApiResult<ShoppingListItem> {
    success(
        state
            .repo
            .add_back_excluded(&user.id, &list_id, &request.excluded_item_id)
            .await?,
    )
}
