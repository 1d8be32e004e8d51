//! Weekly meal plan models.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{optional_length, parse_date, require_length};
use crate::errors::AppError;

/// Lifecycle of a meal plan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MealPlanStatus {
    Draft,
    Active,
    Completed,
}

impl MealPlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealPlanStatus::Draft => "draft",
            MealPlanStatus::Active => "active",
            MealPlanStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(MealPlanStatus::Draft),
            "active" => Some(MealPlanStatus::Active),
            "completed" => Some(MealPlanStatus::Completed),
            _ => None,
        }
    }
}

/// Slot of the day an entry is planned for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "breakfast" => Some(MealType::Breakfast),
            "lunch" => Some(MealType::Lunch),
            "dinner" => Some(MealType::Dinner),
            "snack" => Some(MealType::Snack),
            _ => None,
        }
    }
}

/// One planned meal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanEntry {
    pub id: String,
    pub date: String,
    pub meal_type: MealType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<String>,
    /// Recipe name when `recipe_id` is set, the free-text meal otherwise
    pub title: String,
    pub servings: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A week of planned meals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlan {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub week_start_date: String,
    pub status: MealPlanStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub entries: Vec<MealPlanEntry>,
    pub created_at: String,
    pub updated_at: String,
}

/// Entry as submitted by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryInput {
    pub date: String,
    pub meal_type: MealType,
    #[serde(default)]
    pub recipe_id: Option<String>,
    #[serde(default)]
    pub custom_name: Option<String>,
    #[serde(default = "default_entry_servings")]
    pub servings: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_entry_servings() -> i64 {
    1
}

impl EntryInput {
    /// Validate the entry against the week it belongs to.
    pub fn validate(&self, week_start: NaiveDate) -> Result<(), AppError> {
        let date = parse_date("Entry date", &self.date)?;
        if date < week_start || date > week_start + Duration::days(6) {
            return Err(AppError::Validation(format!(
                "Entry date {} is outside the planned week",
                self.date
            )));
        }
        let has_recipe = self.recipe_id.as_deref().is_some_and(|s| !s.trim().is_empty());
        let has_name = self
            .custom_name
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty());
        if !has_recipe && !has_name {
            return Err(AppError::Validation(
                "Each entry needs a recipe or a meal name".to_string(),
            ));
        }
        optional_length("Meal name", &self.custom_name, 200)?;
        if !(1..=50).contains(&self.servings) {
            return Err(AppError::Validation(
                "Entry servings must be between 1 and 50".to_string(),
            ));
        }
        optional_length("Entry notes", &self.notes, 500)
    }
}

/// Request body for creating a meal plan.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMealPlanRequest {
    pub name: String,
    pub week_start_date: String,
    #[serde(default)]
    pub status: Option<MealPlanStatus>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub entries: Vec<EntryInput>,
}

impl CreateMealPlanRequest {
    pub fn validate(&self) -> Result<NaiveDate, AppError> {
        require_length("Meal plan name", &self.name, 1, 100)?;
        let week_start = parse_date("Week start date", &self.week_start_date)?;
        optional_length("Notes", &self.notes, 1000)?;
        for entry in &self.entries {
            entry.validate(week_start)?;
        }
        Ok(week_start)
    }
}

/// Request body for updating meal plan metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMealPlanRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<MealPlanStatus>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl UpdateMealPlanRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            require_length("Meal plan name", name, 1, 100)?;
        }
        optional_length("Notes", &self.notes, 1000)
    }
}

/// Request body replacing every entry of a plan.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceEntriesRequest {
    pub entries: Vec<EntryInput>,
}

/// Request body for asking the assistant to plan a week from the recipe library.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMealPlanRequest {
    pub week_start_date: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_meal_types")]
    pub meal_types: Vec<MealType>,
    #[serde(default)]
    pub preferences: Option<String>,
}

fn default_meal_types() -> Vec<MealType> {
    vec![MealType::Dinner]
}

impl GenerateMealPlanRequest {
    pub fn validate(&self) -> Result<NaiveDate, AppError> {
        let week_start = parse_date("Week start date", &self.week_start_date)?;
        if self.meal_types.is_empty() {
            return Err(AppError::Validation(
                "At least one meal type is required".to_string(),
            ));
        }
        optional_length("Preferences", &self.preferences, 1000)?;
        Ok(week_start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(date: &str) -> EntryInput {
        EntryInput {
            date: date.to_string(),
            meal_type: MealType::Dinner,
            recipe_id: None,
            custom_name: Some("Leftovers".to_string()),
            servings: 2,
            notes: None,
        }
    }

    #[test]
    fn test_entry_must_fall_in_week() {
        let monday = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        assert!(entry("2024-05-06").validate(monday).is_ok());
        assert!(entry("2024-05-12").validate(monday).is_ok());
        assert!(entry("2024-05-13").validate(monday).is_err());
        assert!(entry("2024-05-05").validate(monday).is_err());
    }

    #[test]
    fn test_entry_needs_recipe_or_name() {
        let monday = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        let mut e = entry("2024-05-07");
        e.custom_name = Some("  ".to_string());
        assert!(e.validate(monday).is_err());
        e.recipe_id = Some("recipe-1".to_string());
        assert!(e.validate(monday).is_ok());
    }
}
