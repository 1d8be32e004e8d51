//! Nutrition analysis for recipes and meal plans.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Duration, NaiveDate};

use crate::grocery::units::round2;
use crate::models::{
    CalorieStatus, DayNutrition, MealPlan, MealPlanNutrition, NutritionFacts, Recipe,
    RecipeNutrition,
};

/// Share of the calorie target a day may deviate by and still count as within.
pub const CALORIE_BAND: f64 = 0.10;

fn scale(facts: &NutritionFacts, factor: f64) -> NutritionFacts {
    let s = |v: Option<f64>| v.map(|v| round2(v * factor));
    NutritionFacts {
        calories: s(facts.calories),
        protein_g: s(facts.protein_g),
        carbs_g: s(facts.carbs_g),
        fat_g: s(facts.fat_g),
    }
}

fn is_complete(facts: &NutritionFacts) -> bool {
    facts.calories.is_some()
        && facts.protein_g.is_some()
        && facts.carbs_g.is_some()
        && facts.fat_g.is_some()
}

/// Per-serving values as stored, and totals for the whole recipe.
pub fn recipe_nutrition(recipe: &Recipe) -> RecipeNutrition {
    RecipeNutrition {
        recipe_id: recipe.id.clone(),
        servings: recipe.servings,
        per_serving: recipe.nutrition.clone(),
        total: scale(&recipe.nutrition, recipe.servings as f64),
        complete: is_complete(&recipe.nutrition),
    }
}

pub fn calorie_status(calories: f64, target: i64) -> CalorieStatus {
    let target = target as f64;
    if calories < target * (1.0 - CALORIE_BAND) {
        CalorieStatus::Under
    } else if calories > target * (1.0 + CALORIE_BAND) {
        CalorieStatus::Over
    } else {
        CalorieStatus::Within
    }
}

/// Daily intake of a plan from the per-serving values of its recipes.
///
/// Every day of the planned week is reported. Entries without a recipe, or
/// whose recipe has no calorie value, are counted as unknown. The average
/// covers only days with at least one known entry.
pub fn meal_plan_nutrition(
    plan: &MealPlan,
    recipes: &HashMap<String, Recipe>,
    daily_calorie_target: Option<i64>,
) -> MealPlanNutrition {
    let mut days: BTreeMap<String, DayNutrition> = BTreeMap::new();
    let mut known_days: BTreeSet<String> = BTreeSet::new();

    if let Ok(start) = NaiveDate::parse_from_str(&plan.week_start_date, "%Y-%m-%d") {
        for offset in 0..7 {
            let date = (start + Duration::days(offset)).format("%Y-%m-%d").to_string();
            days.insert(date.clone(), empty_day(date));
        }
    }

    for entry in &plan.entries {
        let day = days
            .entry(entry.date.clone())
            .or_insert_with(|| empty_day(entry.date.clone()));
        let facts = entry
            .recipe_id
            .as_ref()
            .and_then(|id| recipes.get(id))
            .map(|r| &r.nutrition)
            .filter(|n| n.calories.is_some());
        let Some(facts) = facts else {
            day.unknown_entries += 1;
            continue;
        };
        let servings = entry.servings as f64;
        day.calories += facts.calories.unwrap_or(0.0) * servings;
        day.protein_g += facts.protein_g.unwrap_or(0.0) * servings;
        day.carbs_g += facts.carbs_g.unwrap_or(0.0) * servings;
        day.fat_g += facts.fat_g.unwrap_or(0.0) * servings;
        known_days.insert(entry.date.clone());
    }

    let mut total = NutritionFacts::default();
    let mut counted = 0.0;
    let days: Vec<DayNutrition> = days
        .into_values()
        .map(|mut day| {
            day.calories = round2(day.calories);
            day.protein_g = round2(day.protein_g);
            day.carbs_g = round2(day.carbs_g);
            day.fat_g = round2(day.fat_g);
            if known_days.contains(&day.date) {
                counted += 1.0;
                total.calories = Some(total.calories.unwrap_or(0.0) + day.calories);
                total.protein_g = Some(total.protein_g.unwrap_or(0.0) + day.protein_g);
                total.carbs_g = Some(total.carbs_g.unwrap_or(0.0) + day.carbs_g);
                total.fat_g = Some(total.fat_g.unwrap_or(0.0) + day.fat_g);
                day.calorie_status = daily_calorie_target.map(|t| calorie_status(day.calories, t));
            }
            day
        })
        .collect();

    let daily_average = if counted > 0.0 {
        scale(&total, 1.0 / counted)
    } else {
        NutritionFacts::default()
    };

    MealPlanNutrition {
        meal_plan_id: plan.id.clone(),
        days,
        daily_average,
        daily_calorie_target,
    }
}

fn empty_day(date: String) -> DayNutrition {
    DayNutrition {
        date,
        calories: 0.0,
        protein_g: 0.0,
        carbs_g: 0.0,
        fat_g: 0.0,
        unknown_entries: 0,
        calorie_status: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MealPlanEntry, MealPlanStatus, MealType, RecipeSource};

    fn recipe(id: &str, calories: Option<f64>) -> Recipe {
        Recipe {
            id: id.to_string(),
            user_id: "u1".to_string(),
            name: id.to_string(),
            description: None,
            servings: 4,
            prep_minutes: None,
            cook_minutes: None,
            instructions: Vec::new(),
            tags: Vec::new(),
            nutrition: NutritionFacts {
                calories,
                protein_g: Some(20.0),
                carbs_g: Some(50.0),
                fat_g: Some(10.0),
            },
            source: RecipeSource::Manual,
            ingredients: Vec::new(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn entry(date: &str, recipe_id: Option<&str>, servings: i64) -> MealPlanEntry {
        MealPlanEntry {
            id: format!("{}-{:?}", date, recipe_id),
            date: date.to_string(),
            meal_type: MealType::Dinner,
            recipe_id: recipe_id.map(str::to_string),
            title: "Meal".to_string(),
            servings,
            notes: None,
        }
    }

    #[test]
    fn test_recipe_totals() {
        let n = recipe_nutrition(&recipe("r1", Some(450.0)));
        assert!(n.complete);
        assert_eq!(n.total.calories, Some(1800.0));
        assert_eq!(n.total.fat_g, Some(40.0));

        let n = recipe_nutrition(&recipe("r2", None));
        assert!(!n.complete);
        assert_eq!(n.total.calories, None);
    }

    #[test]
    fn test_calorie_band() {
        assert_eq!(calorie_status(1790.0, 2000), CalorieStatus::Under);
        assert_eq!(calorie_status(1800.0, 2000), CalorieStatus::Within);
        assert_eq!(calorie_status(2200.0, 2000), CalorieStatus::Within);
        assert_eq!(calorie_status(2201.0, 2000), CalorieStatus::Over);
    }

    #[test]
    fn test_meal_plan_days_and_average() {
        let mut recipes = HashMap::new();
        recipes.insert("r1".to_string(), recipe("r1", Some(500.0)));
        recipes.insert("r2".to_string(), recipe("r2", None));

        let plan = MealPlan {
            id: "mp1".to_string(),
            user_id: "u1".to_string(),
            name: "Week".to_string(),
            week_start_date: "2024-03-11".to_string(),
            status: MealPlanStatus::Active,
            notes: None,
            entries: vec![
                entry("2024-03-11", Some("r1"), 2),
                entry("2024-03-11", Some("r2"), 1),
                entry("2024-03-12", Some("r1"), 4),
                entry("2024-03-13", None, 1),
            ],
            created_at: String::new(),
            updated_at: String::new(),
        };

        let n = meal_plan_nutrition(&plan, &recipes, Some(2000));
        assert_eq!(n.days.len(), 7);
        assert_eq!(n.days[0].calories, 1000.0);
        assert_eq!(n.days[0].unknown_entries, 1);
        assert_eq!(n.days[0].calorie_status, Some(CalorieStatus::Under));
        assert_eq!(n.days[1].calories, 2000.0);
        assert_eq!(n.days[1].calorie_status, Some(CalorieStatus::Within));
        assert_eq!(n.days[2].calorie_status, None);
        assert_eq!(n.daily_average.calories, Some(1500.0));
    }
}
