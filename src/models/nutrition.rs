//! Nutrition analysis and nutritionist chat models.

use serde::{Deserialize, Serialize};

use super::{require_length, NutritionFacts};
use crate::errors::AppError;

/// Nutrition of a recipe per serving and for the whole batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeNutrition {
    pub recipe_id: String,
    pub servings: i64,
    pub per_serving: NutritionFacts,
    pub total: NutritionFacts,
    /// All four values are known
    pub complete: bool,
}

/// Summed intake for one day of a meal plan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayNutrition {
    pub date: String,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    /// Entries without a recipe or without nutrition values
    pub unknown_entries: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calorie_status: Option<CalorieStatus>,
}

/// Daily calories compared to the profile target.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CalorieStatus {
    Under,
    Within,
    Over,
}

/// Per-day and average nutrition for a meal plan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanNutrition {
    pub meal_plan_id: String,
    pub days: Vec<DayNutrition>,
    pub daily_average: NutritionFacts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_calorie_target: Option<i64>,
}

/// Author of a nutritionist chat message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(ChatRole::User),
            "assistant" => Some(ChatRole::Assistant),
            _ => None,
        }
    }
}

/// A stored nutritionist chat message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionMessage {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    pub created_at: String,
}

/// Request body for sending a message to the nutritionist.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionistChatRequest {
    pub message: String,
}

impl NutritionistChatRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_length("Message", &self.message, 1, 4000)
    }
}

/// The exchange produced by one chat turn.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionistReply {
    pub message: NutritionMessage,
    pub reply: NutritionMessage,
}
