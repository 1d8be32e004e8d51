//! Prompt construction and reply parsing for the AI features.
//!
//! Every structured feature asks the model for a single JSON object and
//! parses it strictly; replies wrapped in markdown fences are unwrapped first.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use serde::Deserialize;

use super::ChatMessage;
use crate::errors::AppError;
use crate::grocery::dedup::{AiSuggestion, DuplicateGroup};
use crate::grocery::units::{canonical_unit, round2};
use crate::models::{
    ChatRole, CreateRecipeRequest, EntryInput, GenerateMealPlanRequest, GenerateRecipeRequest,
    InventoryItem, MealPlan, MealType, NutritionMessage, Profile, Recipe, RecipeSource,
};

/// Chat history sent with each nutritionist turn.
pub const CHAT_HISTORY_LIMIT: i64 = 20;

const NUTRITIONIST_PROMPT: &str = "You are a friendly registered nutritionist helping a household \
plan healthy meals. Give practical, concise advice grounded in the household's profile and \
current meal plan. Do not diagnose medical conditions; suggest seeing a doctor when a question \
needs one.";

/// Take the JSON object out of a model reply.
pub fn extract_json(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

fn parse_reply<T: for<'de> Deserialize<'de>>(content: &str, what: &str) -> Result<T, AppError> {
    let json = extract_json(content)
        .ok_or_else(|| AppError::Ai(format!("AI reply did not contain a {}", what)))?;
    serde_json::from_str(json)
        .map_err(|e| AppError::Ai(format!("AI reply was not a valid {}: {}", what, e)))
}

fn list_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "none".to_string()
    } else {
        values.join(", ")
    }
}

// ==================== NUTRITIONIST ====================

/// System prompt carrying the household profile and current plan.
pub fn nutritionist_system_prompt(profile: Option<&Profile>, plan: Option<&MealPlan>) -> String {
    let mut prompt = String::from(NUTRITIONIST_PROMPT);

    if let Some(p) = profile {
        prompt.push_str("\n\nHousehold profile:\n");
        prompt.push_str(&format!("- Household size: {}\n", p.household_size));
        prompt.push_str(&format!(
            "- Dietary preferences: {}\n",
            list_or_none(&p.dietary_preferences)
        ));
        prompt.push_str(&format!("- Allergies: {}\n", list_or_none(&p.allergies)));
        if let Some(target) = p.daily_calorie_target {
            prompt.push_str(&format!("- Daily calorie target: {} kcal\n", target));
        }
    }

    if let Some(plan) = plan {
        prompt.push_str(&format!(
            "\nCurrent meal plan \"{}\" (week of {}):\n",
            plan.name, plan.week_start_date
        ));
        for entry in &plan.entries {
            prompt.push_str(&format!(
                "- {} {}: {} ({} servings)\n",
                entry.date,
                entry.meal_type.as_str(),
                entry.title,
                entry.servings
            ));
        }
    }
    prompt
}

/// Messages for one nutritionist turn: system prompt followed by history in
/// chronological order. The newest user message is expected to be in `history`.
pub fn nutritionist_messages(system: String, history: &[NutritionMessage]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ChatMessage::system(system));
    messages.extend(history.iter().map(|m| match m.role {
        ChatRole::User => ChatMessage::user(m.content.clone()),
        ChatRole::Assistant => ChatMessage::assistant(m.content.clone()),
    }));
    messages
}

// ==================== RECIPE GENERATION ====================

pub fn recipe_generation_messages(
    request: &GenerateRecipeRequest,
    profile: Option<&Profile>,
    inventory: &[InventoryItem],
) -> Vec<ChatMessage> {
    let servings = request
        .servings
        .or(profile.map(|p| p.household_size))
        .unwrap_or(2);

    let mut system = String::from(
        "You write home-cooking recipes. Reply with one JSON object and nothing else, shaped as \
{\"name\": string, \"description\": string, \"servings\": integer, \"prepMinutes\": integer, \
\"cookMinutes\": integer, \"instructions\": [string], \"tags\": [string], \
\"nutrition\": {\"calories\": number, \"proteinG\": number, \"carbsG\": number, \"fatG\": number}, \
\"ingredients\": [{\"name\": string, \"quantity\": number, \"unit\": string}]}. \
Nutrition values are per serving. Use metric units or pcs.",
    );
    if let Some(p) = profile {
        system.push_str(&format!(
            " Respect these dietary preferences: {}. Never use these allergens: {}.",
            list_or_none(&p.dietary_preferences),
            list_or_none(&p.allergies)
        ));
    }

    let mut user = format!("{}\nServings: {}", request.prompt.trim(), servings);
    if request.use_inventory && !inventory.is_empty() {
        let on_hand: Vec<String> = inventory
            .iter()
            .map(|i| format!("{} ({} {})", i.name, i.quantity, i.unit))
            .collect();
        user.push_str(&format!(
            "\nPrefer ingredients we already have: {}",
            on_hand.join(", ")
        ));
    }

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Parse a generated recipe into an unsaved draft.
pub fn parse_recipe_draft(content: &str) -> Result<CreateRecipeRequest, AppError> {
    let mut draft: CreateRecipeRequest = parse_reply(content, "recipe")?;
    draft.source = Some(RecipeSource::Ai);
    for ingredient in &mut draft.ingredients {
        ingredient.unit = canonical_unit(&ingredient.unit);
    }
    draft
        .validate()
        .map_err(|e| AppError::Ai(format!("AI recipe was incomplete: {}", e.message())))?;
    Ok(draft)
}

// ==================== MEAL PLAN GENERATION ====================

pub fn meal_plan_generation_messages(
    request: &GenerateMealPlanRequest,
    week_start: NaiveDate,
    recipes: &[Recipe],
    profile: Option<&Profile>,
) -> Vec<ChatMessage> {
    let days: Vec<String> = (0..7)
        .map(|d| (week_start + Duration::days(d)).format("%Y-%m-%d").to_string())
        .collect();
    let meal_types: Vec<&str> = request.meal_types.iter().map(MealType::as_str).collect();

    let system = "You plan a week of meals using only recipes from the household's library. \
Reply with one JSON object and nothing else, shaped as {\"entries\": [{\"date\": \"YYYY-MM-DD\", \
\"mealType\": \"breakfast|lunch|dinner|snack\", \"recipeId\": string, \"servings\": integer}]}. \
Vary the recipes across the week.";

    let mut user = format!(
        "Dates: {}\nMeals per day: {}\n",
        days.join(", "),
        meal_types.join(", ")
    );
    if let Some(p) = profile {
        user.push_str(&format!(
            "Household size: {}\nDietary preferences: {}\nAllergies: {}\n",
            p.household_size,
            list_or_none(&p.dietary_preferences),
            list_or_none(&p.allergies)
        ));
    }
    if let Some(preferences) = &request.preferences {
        user.push_str(&format!("Wishes: {}\n", preferences.trim()));
    }
    user.push_str("Recipes:\n");
    for recipe in recipes {
        user.push_str(&format!(
            "- id={} name=\"{}\" tags=[{}]\n",
            recipe.id,
            recipe.name,
            recipe.tags.join(", ")
        ));
    }

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

#[derive(Debug, Deserialize)]
struct GeneratedPlan {
    entries: Vec<GeneratedEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedEntry {
    date: String,
    meal_type: String,
    recipe_id: String,
    #[serde(default)]
    servings: Option<i64>,
}

/// Parse a generated plan into entries, keeping only entries that reference
/// a known recipe, fall inside the week and use a requested meal type.
pub fn parse_meal_plan_entries(
    content: &str,
    week_start: NaiveDate,
    meal_types: &[MealType],
    recipe_ids: &HashSet<String>,
    default_servings: i64,
) -> Result<Vec<EntryInput>, AppError> {
    let plan: GeneratedPlan = parse_reply(content, "meal plan")?;

    let entries: Vec<EntryInput> = plan
        .entries
        .into_iter()
        .filter_map(|e| {
            let meal_type = MealType::parse(&e.meal_type.to_lowercase())?;
            if !meal_types.contains(&meal_type) || !recipe_ids.contains(&e.recipe_id) {
                return None;
            }
            let entry = EntryInput {
                date: e.date,
                meal_type,
                recipe_id: Some(e.recipe_id),
                custom_name: None,
                servings: e.servings.unwrap_or(default_servings).clamp(1, 50),
                notes: None,
            };
            entry.validate(week_start).ok().map(|_| entry)
        })
        .collect();

    if entries.is_empty() {
        return Err(AppError::Ai(
            "AI meal plan did not reference any of your recipes".to_string(),
        ));
    }
    Ok(entries)
}

// ==================== DEDUP RESOLUTION ====================

pub fn dedup_resolution_messages(group: &DuplicateGroup) -> Vec<ChatMessage> {
    let system = "You help merge duplicate lines on a grocery list whose units cannot be \
converted mechanically. Pick the single unit a shopper would buy and estimate the total. \
Reply with one JSON object and nothing else, shaped as {\"quantity\": number, \"unit\": string, \
\"reasoning\": string}.";

    let lines: Vec<String> = group
        .items
        .iter()
        .map(|i| format!("- {}: {} {}", i.name, i.quantity, i.unit))
        .collect();
    let user = format!(
        "Item: {}\nLines to merge:\n{}",
        group.suggested_name,
        lines.join("\n")
    );
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

#[derive(Debug, Deserialize)]
struct SuggestionReply {
    quantity: f64,
    unit: String,
    #[serde(default)]
    reasoning: String,
}

pub fn parse_dedup_suggestion(content: &str) -> Result<AiSuggestion, AppError> {
    let reply: SuggestionReply = parse_reply(content, "merge suggestion")?;
    if !reply.quantity.is_finite() || reply.quantity < 0.0 {
        return Err(AppError::Ai(
            "AI merge suggestion had an invalid quantity".to_string(),
        ));
    }
    Ok(AiSuggestion {
        quantity: round2(reply.quantity),
        unit: canonical_unit(&reply.unit),
        reasoning: reply.reasoning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_from_fenced_reply() {
        let reply = "Sure!\n```json\n{\"quantity\": 2, \"unit\": \"cans\"}\n```";
        assert_eq!(extract_json(reply), Some("{\"quantity\": 2, \"unit\": \"cans\"}"));
        assert_eq!(extract_json("no json here"), None);
    }

    #[test]
    fn test_parse_dedup_suggestion() {
        let s = parse_dedup_suggestion(
            r#"{"quantity": 2.333, "unit": "Cans", "reasoning": "400 g is about one can"}"#,
        )
        .unwrap();
        assert_eq!(s.quantity, 2.33);
        assert_eq!(s.unit, "can");

        assert!(parse_dedup_suggestion(r#"{"quantity": -1, "unit": "g"}"#).is_err());
        assert!(parse_dedup_suggestion("I cannot help").is_err());
    }

    #[test]
    fn test_parse_recipe_draft_marks_ai_source() {
        let reply = r#"```json
{"name": "Lentil soup", "servings": 4, "instructions": ["Simmer"],
 "nutrition": {"calories": 320, "proteinG": 18},
 "ingredients": [{"name": "Red lentils", "quantity": 250, "unit": "grams"}]}
```"#;
        let draft = parse_recipe_draft(reply).unwrap();
        assert_eq!(draft.name, "Lentil soup");
        assert_eq!(draft.source, Some(RecipeSource::Ai));
        assert_eq!(draft.ingredients[0].unit, "g");
        assert_eq!(draft.nutrition.calories, Some(320.0));

        assert!(parse_recipe_draft(r#"{"name": ""}"#).is_err());
    }

    #[test]
    fn test_parse_meal_plan_filters_unknown_recipes() {
        let week = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        let ids: HashSet<String> = ["r1".to_string()].into_iter().collect();
        let reply = r#"{"entries": [
            {"date": "2024-03-11", "mealType": "dinner", "recipeId": "r1", "servings": 3},
            {"date": "2024-03-12", "mealType": "Dinner", "recipeId": "ghost"},
            {"date": "2024-03-20", "mealType": "dinner", "recipeId": "r1"},
            {"date": "2024-03-13", "mealType": "lunch", "recipeId": "r1"}
        ]}"#;
        let entries = parse_meal_plan_entries(reply, week, &[MealType::Dinner], &ids, 2).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].servings, 3);

        let reply = r#"{"entries": [{"date": "2024-03-11", "mealType": "dinner", "recipeId": "x"}]}"#;
        assert!(parse_meal_plan_entries(reply, week, &[MealType::Dinner], &ids, 2).is_err());
    }
}
