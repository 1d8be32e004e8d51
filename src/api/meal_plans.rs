//! Meal plan endpoints.

use std::collections::HashSet;

use axum::{
    extract::{Path, State},
    Extension,
};

use super::extract::Json;
use super::{require_llm, success, ApiResult, Deleted};
use crate::ai::prompts::{meal_plan_generation_messages, parse_meal_plan_entries};
use crate::ai::ChatRequest;
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::{
    CreateMealPlanRequest, GenerateMealPlanRequest, MealPlan, MealPlanNutrition, MealPlanStatus,
    ReplaceEntriesRequest, UpdateMealPlanRequest,
};
use crate::nutrition::meal_plan_nutrition;
use crate::AppState;

/// GET /api/meal-plans - Plans, most recent week first.
pub async fn list_meal_plans(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Vec<MealPlan>> {
    success(state.repo.list_meal_plans(&user.id).await?)
}

/// GET /api/meal-plans/:id
pub async fn get_meal_plan(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<MealPlan> {
    success(state.repo.get_meal_plan(&user.id, &id).await?)
}

/// POST /api/meal-plans
pub async fn create_meal_plan(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<CreateMealPlanRequest>,
) -> ApiResult<MealPlan> {
    request.validate()?;
    success(state.repo.create_meal_plan(&user.id, &request).await?)
}

/// PUT /api/meal-plans/:id - Update name, status or notes.
pub async fn update_meal_plan(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateMealPlanRequest>,
) -> ApiResult<MealPlan> {
    request.validate()?;
    success(state.repo.update_meal_plan(&user.id, &id, &request).await?)
}

/// PUT /api/meal-plans/:id/entries - Replace every entry of the plan.
pub async fn replace_meal_plan_entries(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(request): Json<ReplaceEntriesRequest>,
) -> ApiResult<MealPlan> {
    success(state.repo.replace_entries(&user.id, &id, &request.entries).await?)
}

/// DELETE /api/meal-plans/:id
pub async fn delete_meal_plan(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    state.repo.delete_meal_plan(&user.id, &id).await?;
    success(Deleted { deleted: true })
}

/// GET /api/meal-plans/:id/nutrition - Daily totals against the calorie target.
pub async fn get_meal_plan_nutrition(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<MealPlanNutrition> {
    let (plan, recipes, profile) = tokio::try_join!(
        state.repo.get_meal_plan(&user.id, &id),
        state.repo.recipes_by_id(&user.id),
        state.repo.get_profile(&user.id),
    )?;
    let target = profile.and_then(|p| p.daily_calorie_target);
    success(meal_plan_nutrition(&plan, &recipes, target))
}

/// POST /api/meal-plans/generate - Plan a week from the recipe library and save it as a draft.
pub async fn generate_meal_plan(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<GenerateMealPlanRequest>,
) -> ApiResult<MealPlan> {
    let llm = require_llm(&state)?;
    let week_start = request.validate()?;

    let recipes = state.repo.list_recipes(&user.id).await?;
    if recipes.is_empty() {
        return Err(AppError::Validation(
            "Add some recipes before generating a meal plan".to_string(),
        ));
    }
    let profile = state.repo.get_profile(&user.id).await?;
    let servings = profile.as_ref().map(|p| p.household_size).unwrap_or(2);

    let messages =
        meal_plan_generation_messages(&request, week_start, &recipes, profile.as_ref());
    let reply = llm
        .complete(&ChatRequest::new(messages).with_temperature(0.7).json())
        .await?;

    let recipe_ids: HashSet<String> = recipes.iter().map(|r| r.id.clone()).collect();
    let entries = parse_meal_plan_entries(
        &reply.content,
        week_start,
        &request.meal_types,
        &recipe_ids,
        servings,
    )?;

    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Week of {}", request.week_start_date.trim()));
    let create = CreateMealPlanRequest {
        name,
        week_start_date: request.week_start_date.trim().to_string(),
        status: Some(MealPlanStatus::Draft),
        notes: request.preferences.clone(),
        entries,
    };
    create.validate()?;
    let plan = state.repo.create_meal_plan(&user.id, &create).await?;

    tracing::info!(
        user_id = %user.id,
        meal_plan_id = %plan.id,
        entries = plan.entries.len(),
        "Generated meal plan"
    );
    success(plan)
}
