//! Shopping list item endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension,
};
use tokio::{sync::Semaphore, task::JoinError};

use super::extract::Json;
use super::{success, ApiResult, Deleted};
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::{
    BulkItemResult, BulkPurchaseRequest, CreateItemRequest, ListStatus, ShoppingListItem,
    UpdateItemRequest,
};
use crate::AppState;

/// Concurrent item updates of one bulk request.
const BULK_CONCURRENCY: usize = 4;

/// GET /api/shopping-lists/:id/items
pub async fn list_items(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(list_id): Path<String>,
) -> ApiResult<Vec<ShoppingListItem>> {
    state.repo.get_shopping_list(&user.id, &list_id).await?;
    success(state.repo.list_items(&list_id).await?)
}

/// POST /api/shopping-lists/:id/items - Add a manual item at the end of the list.
pub async fn add_item(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(list_id): Path<String>,
    Json(request): Json<CreateItemRequest>,
) -> ApiResult<ShoppingListItem> {
    request.validate()?;
    success(state.repo.add_item(&user.id, &list_id, &request).await?)
}

/// PATCH /api/shopping-lists/:id/items/:item_id
pub async fn update_item(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((list_id, item_id)): Path<(String, String)>,
    Json(request): Json<UpdateItemRequest>,
) -> ApiResult<ShoppingListItem> {
    request.validate()?;
    success(
        state
            .repo
            .update_item(&user.id, &list_id, &item_id, &request)
            .await?,
    )
}

/// DELETE /api/shopping-lists/:id/items/:item_id
pub async fn delete_item(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((list_id, item_id)): Path<(String, String)>,
) -> ApiResult<Deleted> {
    state.repo.delete_item(&user.id, &list_id, &item_id).await?;
    success(Deleted { deleted: true })
}

/// POST /api/shopping-lists/:id/items/bulk-purchase
///
/// Items are updated independently; one failure does not stop the others.
pub async fn bulk_purchase(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(list_id): Path<String>,
    Json(request): Json<BulkPurchaseRequest>,
) -> ApiResult<Vec<BulkItemResult>> {
    let list = state.repo.get_mutable_list(&user.id, &list_id).await?;
    if list.status != ListStatus::Finalized {
        return Err(AppError::InvalidState(
            "Items can only be marked purchased on a finalized list".to_string(),
        ));
    }

    let semaphore = Arc::new(Semaphore::new(BULK_CONCURRENCY));
    let mut handles = Vec::with_capacity(request.item_ids.len());

    for item_id in request.item_ids {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| AppError::Internal(format!("Bulk semaphore closed: {}", e)))?;
        let repo = state.repo.clone();
        let user_id = user.id.clone();
        let list_id = list_id.clone();
        let purchased = request.purchased;

        let task_item_id = item_id.clone();
        let handle = tokio::spawn(async move {
            let _permit = permit;
            let outcome = repo
                .set_item_purchased(&user_id, &list_id, &task_item_id, purchased)
                .await;
            BulkItemResult {
                success: outcome.is_ok(),
                error: outcome.err().map(|e| e.message()),
                item_id: task_item_id,
            }
        });
        handles.push((item_id, handle));
    }

    let mut results = Vec::with_capacity(handles.len());
    for (item_id, handle) in handles {
        results.push(joined_result(&list_id, item_id, handle.await));
    }

    let failed = results.iter().filter(|r| !r.success).count();
    tracing::info!(
        list_id = %list_id,
        total = results.len(),
        failed,
        purchased = request.purchased,
        "Bulk purchase applied"
    );
    success(results)
}

/// POST /api/shopping-lists/:id/items/suggest-categories
///
/// Returns the items that received a category.
pub async fn suggest_categories(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(list_id): Path<String>,
) -> ApiResult<Vec<ShoppingListItem>> {
    success(state.repo.suggest_item_categories(&user.id, &list_id).await?)
}

/// Per-item result of a bulk task; a task that did not finish counts as failed.
fn joined_result(
    list_id: &str,
    item_id: String,
    joined: Result<BulkItemResult, JoinError>,
) -> BulkItemResult {
    match joined {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(list_id = %list_id, item_id = %item_id, "Bulk purchase task failed: {}", e);
            BulkItemResult {
                item_id,
                success: false,
                error: Some("Update did not complete".to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unfinished_task_still_reports_its_item() {
        let handle: tokio::task::JoinHandle<BulkItemResult> =
            tokio::spawn(async { panic!("task aborted") });

        let result = joined_result("list-1", "item-7".to_string(), handle.await);
        assert_eq!(result.item_id, "item-7");
        assert!(!result.success);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_finished_task_passes_through() {
        let handle = tokio::spawn(async {
            BulkItemResult {
                item_id: "item-1".to_string(),
                success: true,
                error: None,
            }
        });

        let result = joined_result("list-1", "item-1".to_string(), handle.await);
        assert!(result.success);
        assert!(result.error.is_none());
    }
}
