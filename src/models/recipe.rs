//! Recipe library models.

use serde::{Deserialize, Serialize};

use super::{optional_length, require_length, require_non_negative};
use crate::errors::AppError;

/// Where a recipe came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecipeSource {
    Manual,
    Ai,
}

impl RecipeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipeSource::Manual => "manual",
            RecipeSource::Ai => "ai",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(RecipeSource::Manual),
            "ai" => Some(RecipeSource::Ai),
            _ => None,
        }
    }
}

/// Per-serving nutrition values. Any of them may be unknown.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NutritionFacts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat_g: Option<f64>,
}

impl NutritionFacts {
    pub fn validate(&self) -> Result<(), AppError> {
        for (field, value) in [
            ("Calories", self.calories),
            ("Protein", self.protein_g),
            ("Carbs", self.carbs_g),
            ("Fat", self.fat_g),
        ] {
            if let Some(v) = value {
                require_non_negative(field, v)?;
            }
        }
        Ok(())
    }
}

/// One ingredient line of a recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredient {
    pub id: String,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub position: i64,
}

/// A recipe together with its ingredients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub servings: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prep_minutes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cook_minutes: Option<i64>,
    pub instructions: Vec<String>,
    pub tags: Vec<String>,
    pub nutrition: NutritionFacts,
    pub source: RecipeSource,
    pub ingredients: Vec<RecipeIngredient>,
    pub created_at: String,
    pub updated_at: String,
}

/// Ingredient line as submitted by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientInput {
    pub name: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl IngredientInput {
    pub fn validate(&self) -> Result<(), AppError> {
        require_length("Ingredient name", &self.name, 1, 100)?;
        require_non_negative("Ingredient quantity", self.quantity)?;
        optional_length("Ingredient unit", &Some(self.unit.clone()), 20)
    }
}

/// Request body for creating a recipe. Also the shape of an AI-generated draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecipeRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_servings")]
    pub servings: i64,
    #[serde(default)]
    pub prep_minutes: Option<i64>,
    #[serde(default)]
    pub cook_minutes: Option<i64>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub nutrition: NutritionFacts,
    #[serde(default)]
    pub source: Option<RecipeSource>,
    #[serde(default)]
    pub ingredients: Vec<IngredientInput>,
}

fn default_servings() -> i64 {
    2
}

impl CreateRecipeRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_length("Recipe name", &self.name, 1, 200)?;
        optional_length("Description", &self.description, 2000)?;
        validate_servings(self.servings)?;
        validate_minutes(self.prep_minutes, self.cook_minutes)?;
        self.nutrition.validate()?;
        if self.ingredients.len() > 100 {
            return Err(AppError::Validation(
                "A recipe can have at most 100 ingredients".to_string(),
            ));
        }
        for ingredient in &self.ingredients {
            ingredient.validate()?;
        }
        Ok(())
    }
}

/// Request body for updating a recipe. `ingredients` replaces the whole list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecipeRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub servings: Option<i64>,
    #[serde(default)]
    pub prep_minutes: Option<i64>,
    #[serde(default)]
    pub cook_minutes: Option<i64>,
    #[serde(default)]
    pub instructions: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub nutrition: Option<NutritionFacts>,
    #[serde(default)]
    pub ingredients: Option<Vec<IngredientInput>>,
}

impl UpdateRecipeRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            require_length("Recipe name", name, 1, 200)?;
        }
        optional_length("Description", &self.description, 2000)?;
        if let Some(servings) = self.servings {
            validate_servings(servings)?;
        }
        validate_minutes(self.prep_minutes, self.cook_minutes)?;
        if let Some(nutrition) = &self.nutrition {
            nutrition.validate()?;
        }
        for ingredient in self.ingredients.iter().flatten() {
            ingredient.validate()?;
        }
        Ok(())
    }
}

fn validate_servings(servings: i64) -> Result<(), AppError> {
    if !(1..=100).contains(&servings) {
        return Err(AppError::Validation(
            "Servings must be between 1 and 100".to_string(),
        ));
    }
    Ok(())
}

fn validate_minutes(prep: Option<i64>, cook: Option<i64>) -> Result<(), AppError> {
    if prep.is_some_and(|m| m < 0) || cook.is_some_and(|m| m < 0) {
        return Err(AppError::Validation(
            "Preparation and cooking time must be zero or greater".to_string(),
        ));
    }
    Ok(())
}

/// Request body for asking the assistant to draft a recipe.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRecipeRequest {
    pub prompt: String,
    #[serde(default)]
    pub servings: Option<i64>,
    /// Use ingredients currently in the inventory as a starting point
    #[serde(default)]
    pub use_inventory: bool,
}

impl GenerateRecipeRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_length("Prompt", &self.prompt, 3, 1000)?;
        if let Some(servings) = self.servings {
            validate_servings(servings)?;
        }
        Ok(())
    }
}

/// Recipe search query parameters.
#[derive(Debug, Deserialize)]
pub struct RecipeSearchQuery {
    pub q: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

/// Single recipe search hit.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSearchHit {
    pub recipe: Recipe,
    pub score: f32,
}

/// Paged recipe search response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSearchResponse {
    pub results: Vec<RecipeSearchHit>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}
