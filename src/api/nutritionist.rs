//! Nutritionist chat endpoints.

use axum::{extract::State, Extension};
use serde::Serialize;

use super::extract::Json;
use super::{require_llm, success, ApiResult};
use crate::ai::prompts::{nutritionist_messages, nutritionist_system_prompt, CHAT_HISTORY_LIMIT};
use crate::ai::ChatRequest;
use crate::auth::CurrentUser;
use crate::db::today;
use crate::models::{ChatRole, NutritionMessage, NutritionistChatRequest, NutritionistReply};
use crate::AppState;

/// Messages returned by the history endpoint.
const HISTORY_PAGE_SIZE: i64 = 200;

#[derive(Debug, Serialize)]
pub struct ClearedHistory {
    pub deleted: u64,
}

/// POST /api/nutritionist/chat - Send a message and store the reply.
pub async fn nutritionist_chat(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<NutritionistChatRequest>,
) -> ApiResult<NutritionistReply> {
    let llm = require_llm(&state)?;
    request.validate()?;

    let message = state
        .repo
        .add_nutrition_message(&user.id, ChatRole::User, request.message.trim())
        .await?;

    let (profile, plan, history) = tokio::try_join!(
        state.repo.get_profile(&user.id),
        state.repo.current_meal_plan(&user.id, today()),
        state.repo.recent_nutrition_messages(&user.id, CHAT_HISTORY_LIMIT),
    )?;

    let system = nutritionist_system_prompt(profile.as_ref(), plan.as_ref());
    let reply = llm
        .complete(&ChatRequest::new(nutritionist_messages(system, &history)).with_temperature(0.6))
        .await?;

    let reply = state
        .repo
        .add_nutrition_message(&user.id, ChatRole::Assistant, reply.content.trim())
        .await?;

    tracing::debug!(user_id = %user.id, history = history.len(), "Nutritionist replied");
    success(NutritionistReply { message, reply })
}

/// GET /api/nutritionist/history - Conversation in chronological order.
pub async fn nutritionist_history(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Vec<NutritionMessage>> {
    success(
        state
            .repo
            .recent_nutrition_messages(&user.id, HISTORY_PAGE_SIZE)
            .await?,
    )
}

/// DELETE /api/nutritionist/history
pub async fn clear_nutritionist_history(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<ClearedHistory> {
    let deleted = state.repo.clear_nutrition_history(&user.id).await?;
    tracing::info!(user_id = %user.id, deleted, "Cleared nutritionist history");
    success(ClearedHistory { deleted })
}
