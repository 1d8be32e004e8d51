//! Recipe endpoints, including search, nutrition and AI drafts.

use axum::{
    extract::{Path, State},
    Extension,
};

use super::extract::{Json, Query};
use super::{require_llm, success, ApiResult, Deleted};
use crate::ai::prompts::{parse_recipe_draft, recipe_generation_messages};
use crate::ai::ChatRequest;
use crate::auth::CurrentUser;
use crate::models::{
    CreateRecipeRequest, GenerateRecipeRequest, Recipe, RecipeNutrition, RecipeSearchHit,
    RecipeSearchQuery, RecipeSearchResponse, UpdateRecipeRequest,
};
use crate::nutrition::recipe_nutrition;
use crate::AppState;

/// Maximum number of search results allowed.
const MAX_SEARCH_LIMIT: usize = 100;

/// GET /api/recipes - List the user's recipes.
pub async fn list_recipes(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Vec<Recipe>> {
    success(state.repo.list_recipes(&user.id).await?)
}

/// GET /api/recipes/:id
pub async fn get_recipe(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Recipe> {
    success(state.repo.get_recipe(&user.id, &id).await?)
}

/// POST /api/recipes
pub async fn create_recipe(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<CreateRecipeRequest>,
) -> ApiResult<Recipe> {
    request.validate()?;
    let recipe = state.repo.create_recipe(&user.id, &request).await?;
    reindex_recipe(&state, &recipe).await;
    success(recipe)
}

/// PUT /api/recipes/:id
pub async fn update_recipe(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateRecipeRequest>,
) -> ApiResult<Recipe> {
    request.validate()?;
    let recipe = state.repo.update_recipe(&user.id, &id, &request).await?;
    reindex_recipe(&state, &recipe).await;
    success(recipe)
}

/// DELETE /api/recipes/:id
pub async fn delete_recipe(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    state.repo.delete_recipe(&user.id, &id).await?;
    if let Err(e) = state.search.remove_recipe(&id).await {
        tracing::warn!(recipe_id = %id, "Failed to remove recipe from search index: {}", e);
    }
    success(Deleted { deleted: true })
}

/// GET /api/recipes/search - Full-text search over the user's recipes.
pub async fn search_recipes(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<RecipeSearchQuery>,
) -> ApiResult<RecipeSearchResponse> {
    let limit = params.limit.min(MAX_SEARCH_LIMIT);
    let hits = state.search.search(&user.id, &params.q, limit, params.offset)?;

    let mut results = Vec::with_capacity(hits.len());
    for hit in hits {
        match state.repo.get_recipe(&user.id, &hit.recipe_id).await {
            Ok(recipe) => results.push(RecipeSearchHit {
                recipe,
                score: hit.score,
            }),
            Err(e) => tracing::debug!(recipe_id = %hit.recipe_id, "Skipping stale search hit: {}", e),
        }
    }

    let total = results.len();
    success(RecipeSearchResponse {
        results,
        total,
        limit,
        offset: params.offset,
    })
}

/// GET /api/recipes/:id/nutrition
pub async fn get_recipe_nutrition(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<RecipeNutrition> {
    let recipe = state.repo.get_recipe(&user.id, &id).await?;
    success(recipe_nutrition(&recipe))
}

/// POST /api/recipes/generate - Draft a recipe with the assistant. Nothing is saved.
pub async fn generate_recipe(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<GenerateRecipeRequest>,
) -> ApiResult<CreateRecipeRequest> {
    let llm = require_llm(&state)?;
    request.validate()?;

    let profile = state.repo.get_profile(&user.id).await?;
    let inventory = if request.use_inventory {
        state.repo.list_inventory(&user.id).await?
    } else {
        Vec::new()
    };

    let messages = recipe_generation_messages(&request, profile.as_ref(), &inventory);
    let reply = llm
        .complete(&ChatRequest::new(messages).with_temperature(0.7).json())
        .await?;
    let draft = parse_recipe_draft(&reply.content)?;

    tracing::info!(user_id = %user.id, provider = llm.name(), "Generated recipe draft");
    success(draft)
}

async fn reindex_recipe(state: &AppState, recipe: &Recipe) {
    if let Err(e) = state.search.index_recipe(recipe).await {
        tracing::warn!(recipe_id = %recipe.id, "Failed to update search index: {}", e);
    }
}
