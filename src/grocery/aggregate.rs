//! Meal-plan ingredient aggregation and inventory coverage.
//!
//! Recipe ingredients of every planned meal are scaled to the entry's
//! servings and folded into one line per (name key, unit dimension). When
//! the inventory is checked, each line is compared with what the household
//! already has and is kept, reduced to the shortfall, or excluded.

use std::collections::HashMap;

use serde::Serialize;

use super::normalize::name_key;
use super::units::{combinable, convert, round2, sum_quantities};
use crate::models::{InventoryItem, ItemSource, MealPlan, Recipe, SourceDetail};

/// Whether a line still has to be bought.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LineStatus {
    Needed,
    Partial,
    Excluded,
}

/// One aggregated ingredient of a meal plan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportLine {
    pub name: String,
    pub key: String,
    /// Quantity to put on the list
    pub quantity: f64,
    pub unit: String,
    /// Quantity the recipes call for
    pub required_quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_unit: Option<String>,
    pub status: LineStatus,
    pub source_details: Vec<SourceDetail>,
}

/// Preview returned before a meal-plan import is committed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanImportPreview {
    pub meal_plan_id: String,
    pub meal_plan_name: String,
    pub lines: Vec<ImportLine>,
}

struct Accumulator {
    name: String,
    key: String,
    parts: Vec<(f64, String)>,
    details: Vec<SourceDetail>,
}

impl Accumulator {
    fn accepts(&self, key: &str, unit: &str) -> bool {
        self.key == key && self.parts.iter().all(|(_, u)| combinable(u, unit))
    }

    fn add_detail(&mut self, detail: SourceDetail) {
        let existing = self.details.iter_mut().find(|d| {
            d.ref_id == detail.ref_id && d.unit == detail.unit && d.meal_plan_id == detail.meal_plan_id
        });
        match existing {
            Some(d) => d.quantity = round2(d.quantity + detail.quantity),
            None => self.details.push(detail),
        }
    }

    fn into_line(self) -> Option<ImportLine> {
        let combined = sum_quantities(self.parts.iter().map(|(q, u)| (*q, u.as_str())))?;
        Some(ImportLine {
            name: self.name,
            key: self.key,
            quantity: combined.quantity,
            unit: combined.unit,
            required_quantity: combined.quantity,
            inventory_quantity: None,
            inventory_unit: None,
            status: LineStatus::Needed,
            source_details: self.details,
        })
    }
}

/// Aggregate the recipe ingredients of a plan's entries.
///
/// Entries without a recipe, or whose recipe is missing from `recipes`,
/// contribute nothing.
pub fn aggregate_ingredients(plan: &MealPlan, recipes: &HashMap<String, Recipe>) -> Vec<ImportLine> {
    let mut acc: Vec<Accumulator> = Vec::new();

    for entry in &plan.entries {
        let Some(recipe) = entry.recipe_id.as_ref().and_then(|id| recipes.get(id)) else {
            continue;
        };
        let scale = entry.servings as f64 / recipe.servings.max(1) as f64;

        for ingredient in &recipe.ingredients {
            let key = name_key(&ingredient.name);
            if key.is_empty() {
                continue;
            }
            let quantity = round2(ingredient.quantity * scale);
            let detail = SourceDetail {
                kind: ItemSource::Recipe,
                ref_id: Some(recipe.id.clone()),
                label: recipe.name.clone(),
                meal_plan_id: Some(plan.id.clone()),
                quantity,
                unit: ingredient.unit.clone(),
            };

            match acc.iter_mut().find(|a| a.accepts(&key, &ingredient.unit)) {
                Some(a) => {
                    a.parts.push((quantity, ingredient.unit.clone()));
                    a.add_detail(detail);
                }
                None => acc.push(Accumulator {
                    name: ingredient.name.trim().to_string(),
                    key,
                    parts: vec![(quantity, ingredient.unit.clone())],
                    details: vec![detail],
                }),
            }
        }
    }

    acc.into_iter().filter_map(Accumulator::into_line).collect()
}

/// Compare lines with the inventory, reducing or excluding covered ones.
pub fn apply_inventory(lines: &mut [ImportLine], inventory: &[InventoryItem]) {
    for line in lines.iter_mut() {
        let available: f64 = inventory
            .iter()
            .filter(|inv| name_key(&inv.name) == line.key)
            .filter_map(|inv| convert(inv.quantity, &inv.unit, &line.unit))
            .sum();
        if available <= 0.0 {
            continue;
        }
        let available = round2(available);
        line.inventory_quantity = Some(available);
        line.inventory_unit = Some(line.unit.clone());
        if available >= line.required_quantity {
            line.status = LineStatus::Excluded;
            line.quantity = 0.0;
        } else {
            line.status = LineStatus::Partial;
            line.quantity = round2(line.required_quantity - available);
        }
    }
}

/// Build the import lines of a plan, optionally checked against the inventory.
pub fn plan_import_lines(
    plan: &MealPlan,
    recipes: &HashMap<String, Recipe>,
    inventory: Option<&[InventoryItem]>,
) -> Vec<ImportLine> {
    let mut lines = aggregate_ingredients(plan, recipes);
    if let Some(inventory) = inventory {
        apply_inventory(&mut lines, inventory);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        MealPlanEntry, MealPlanStatus, MealType, NutritionFacts, RecipeIngredient, RecipeSource,
        StorageLocation,
    };

    fn recipe(id: &str, servings: i64, ingredients: &[(&str, f64, &str)]) -> Recipe {
        Recipe {
            id: id.to_string(),
            user_id: "u1".to_string(),
            name: format!("Recipe {}", id),
            description: None,
            servings,
            prep_minutes: None,
            cook_minutes: None,
            instructions: Vec::new(),
            tags: Vec::new(),
            nutrition: NutritionFacts::default(),
            source: RecipeSource::Manual,
            ingredients: ingredients
                .iter()
                .enumerate()
                .map(|(i, (name, quantity, unit))| RecipeIngredient {
                    id: format!("{}-{}", id, i),
                    name: name.to_string(),
                    quantity: *quantity,
                    unit: unit.to_string(),
                    notes: None,
                    position: i as i64,
                })
                .collect(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn entry(recipe_id: &str, servings: i64) -> MealPlanEntry {
        MealPlanEntry {
            id: format!("e-{}-{}", recipe_id, servings),
            date: "2024-03-11".to_string(),
            meal_type: MealType::Dinner,
            recipe_id: Some(recipe_id.to_string()),
            title: String::new(),
            servings,
            notes: None,
        }
    }

    fn plan(entries: Vec<MealPlanEntry>) -> MealPlan {
        MealPlan {
            id: "mp1".to_string(),
            user_id: "u1".to_string(),
            name: "Week".to_string(),
            week_start_date: "2024-03-11".to_string(),
            status: MealPlanStatus::Active,
            notes: None,
            entries,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn stock(name: &str, quantity: f64, unit: &str) -> InventoryItem {
        InventoryItem {
            id: format!("inv-{}", name),
            user_id: "u1".to_string(),
            name: name.to_string(),
            quantity,
            unit: unit.to_string(),
            category: None,
            location: StorageLocation::Pantry,
            expiry_date: None,
            notes: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn recipes() -> HashMap<String, Recipe> {
        let mut map = HashMap::new();
        map.insert(
            "r1".to_string(),
            recipe("r1", 2, &[("Onions", 2.0, "pcs"), ("Rice", 200.0, "g")]),
        );
        map.insert(
            "r2".to_string(),
            recipe("r2", 4, &[("onion", 1.0, "pcs"), ("Rice", 1.0, "kg"), ("Stock", 1.0, "can")]),
        );
        map
    }

    #[test]
    fn test_aggregates_across_recipes_with_scaling() {
        let lines = aggregate_ingredients(&plan(vec![entry("r1", 4), entry("r2", 2)]), &recipes());
        assert_eq!(lines.len(), 3);

        let onion = lines.iter().find(|l| l.key == "onion").unwrap();
        // r1 doubled (4 pcs) + r2 halved (0.5 pcs)
        assert_eq!(onion.quantity, 4.5);
        assert_eq!(onion.unit, "pcs");
        assert_eq!(onion.source_details.len(), 2);

        let rice = lines.iter().find(|l| l.key == "rice").unwrap();
        assert_eq!(rice.quantity, 900.0);
        assert_eq!(rice.unit, "g");
    }

    #[test]
    fn test_entries_without_recipe_are_skipped() {
        let mut custom = entry("missing", 2);
        custom.recipe_id = None;
        let lines = aggregate_ingredients(&plan(vec![custom, entry("missing", 1)]), &recipes());
        assert!(lines.is_empty());
    }

    #[test]
    fn test_inventory_excludes_and_reduces() {
        let inventory = vec![stock("Rice", 2.0, "kg"), stock("onions", 1.0, "pcs")];
        let lines = plan_import_lines(&plan(vec![entry("r1", 2)]), &recipes(), Some(&inventory));

        let rice = lines.iter().find(|l| l.key == "rice").unwrap();
        assert_eq!(rice.status, LineStatus::Excluded);
        assert_eq!(rice.inventory_quantity, Some(2000.0));

        let onion = lines.iter().find(|l| l.key == "onion").unwrap();
        assert_eq!(onion.status, LineStatus::Partial);
        assert_eq!(onion.quantity, 1.0);
        assert_eq!(onion.required_quantity, 2.0);
    }

    #[test]
    fn test_incompatible_inventory_unit_is_ignored() {
        let inventory = vec![stock("Stock", 500.0, "ml")];
        let lines = plan_import_lines(&plan(vec![entry("r2", 4)]), &recipes(), Some(&inventory));
        let line = lines.iter().find(|l| l.key == "stock").unwrap();
        assert_eq!(line.status, LineStatus::Needed);
        assert!(line.inventory_quantity.is_none());
    }
}
