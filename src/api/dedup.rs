//! Duplicate detection and merging on shopping lists.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension,
};

use super::extract::{Json, Query};
use super::{success, ApiResult};
use crate::ai::prompts::{dedup_resolution_messages, parse_dedup_suggestion};
use crate::ai::{ChatRequest, LlmProvider};
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::grocery::dedup::{find_duplicate_groups, AiSuggestion, CombinedQuantity, DuplicateGroup};
use crate::models::{CombineAllResult, DedupQuery, MergeItemsRequest, MergeResult};
use crate::AppState;

/// GET /api/shopping-lists/:id/deduplicate?useAI= - Duplicate groups of the list.
pub async fn find_duplicates(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(list_id): Path<String>,
    Query(query): Query<DedupQuery>,
) -> ApiResult<Vec<DuplicateGroup>> {
    state.repo.get_shopping_list(&user.id, &list_id).await?;
    let items = state.repo.list_items(&list_id).await?;
    let mut groups = find_duplicate_groups(&items);

    if query.use_ai {
        match &state.llm {
            Some(llm) => {
                for group in groups.iter_mut().filter(|g| g.requires_resolution) {
                    match suggest_resolution(llm, group).await {
                        Ok(suggestion) => group.ai_suggestion = Some(suggestion),
                        Err(e) => {
                            tracing::warn!(list_id = %list_id, key = %group.key, "AI resolution failed: {}", e)
                        }
                    }
                }
            }
            None => tracing::warn!("useAI requested but no LLM is configured"),
        }
    }

    success(groups)
}

/// POST /api/shopping-lists/:id/deduplicate - Merge the given items into one.
///
/// The combined value is the explicit quantity and unit when both are given,
/// the direct sum when the units combine, and an AI suggestion otherwise.
pub async fn merge_duplicates(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(list_id): Path<String>,
    Json(request): Json<MergeItemsRequest>,
) -> ApiResult<MergeResult> {
    request.validate()?;

    let mut resolution = match (request.quantity, request.unit.as_deref()) {
        (Some(quantity), Some(unit)) => Some(CombinedQuantity {
            quantity,
            unit: unit.to_string(),
        }),
        _ => None,
    };

    if resolution.is_none() && request.use_ai {
        resolution = ai_resolution(&state, &user.id, &list_id, &request.item_ids).await?;
    }

    let result = state
        .repo
        .merge_items(
            &user.id,
            &list_id,
            &request.item_ids,
            resolution,
            request.name.as_deref(),
        )
        .await?;

    tracing::info!(
        list_id = %list_id,
        deleted = result.deleted_count,
        "Merged duplicate items"
    );
    success(result)
}

/// POST /api/shopping-lists/:id/deduplicate/all - Merge every directly combinable group.
pub async fn combine_all_duplicates(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(list_id): Path<String>,
) -> ApiResult<CombineAllResult> {
    success(state.repo.combine_all_duplicates(&user.id, &list_id).await?)
}

/// AI resolution for items whose units do not combine directly.
async fn ai_resolution(
    state: &AppState,
    user_id: &str,
    list_id: &str,
    item_ids: &[String],
) -> Result<Option<CombinedQuantity>, AppError> {
    let Some(llm) = &state.llm else {
        tracing::warn!("useAI requested but no LLM is configured");
        return Ok(None);
    };

    state.repo.get_shopping_list(user_id, list_id).await?;
    let selected: Vec<_> = state
        .repo
        .list_items(list_id)
        .await?
        .into_iter()
        .filter(|i| item_ids.contains(&i.id))
        .collect();

    let Some(group) = find_duplicate_groups(&selected)
        .into_iter()
        .find(|g| g.requires_resolution)
    else {
        return Ok(None);
    };

    let suggestion = suggest_resolution(llm, &group).await?;
    tracing::debug!(list_id = %list_id, reasoning = %suggestion.reasoning, "Using AI merge resolution");
    Ok(Some(CombinedQuantity {
        quantity: suggestion.quantity,
        unit: suggestion.unit,
    }))
}

async fn suggest_resolution(
    llm: &Arc<dyn LlmProvider>,
    group: &DuplicateGroup,
) -> Result<AiSuggestion, AppError> {
    let request = ChatRequest::new(dedup_resolution_messages(group))
        .with_temperature(0.0)
        .json();
    let reply = llm.complete(&request).await?;
    parse_dedup_suggestion(&reply.content)
}
