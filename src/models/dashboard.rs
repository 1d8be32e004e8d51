//! Dashboard summary model.

use serde::Serialize;

use super::{InventoryItem, MealPlan, MealPlanEntry, Profile, ShoppingList};

/// The meal plan covering today, with today's entries pulled out.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentMealPlan {
    pub plan: MealPlan,
    pub today: Vec<MealPlanEntry>,
}

/// Headline counters.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCounts {
    pub recipes: i64,
    pub inventory_items: i64,
    pub staples_due: i64,
    pub open_shopping_lists: i64,
}

/// Everything the home screen needs in one payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub profile: Option<Profile>,
    pub meal_plan: Option<CurrentMealPlan>,
    pub shopping_list: Option<ShoppingList>,
    pub expiring_inventory: Vec<InventoryItem>,
    pub counts: DashboardCounts,
}
