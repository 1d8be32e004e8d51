//! Home screen summary.

use chrono::NaiveDate;

use super::repository::{format_date, Repository};
use crate::errors::AppError;
use crate::models::{CurrentMealPlan, DashboardCounts, DashboardSummary};

/// Inventory expiring within this many days shows on the dashboard.
pub const DASHBOARD_EXPIRY_DAYS: i64 = 3;

impl Repository {
    /// Run the independent dashboard reads concurrently.
    pub async fn dashboard(&self, user_id: &str, today: NaiveDate) -> Result<DashboardSummary, AppError> {
        let (profile, meal_plan, shopping_list, expiring_inventory, counts) = tokio::try_join!(
            self.get_profile(user_id),
            self.current_meal_plan(user_id, today),
            self.latest_open_list(user_id),
            self.expiring_inventory(user_id, today, DASHBOARD_EXPIRY_DAYS),
            self.dashboard_counts(user_id, today),
        )?;

        let today_str = format_date(today);
        let meal_plan = meal_plan.map(|plan| {
            let todays_entries = plan
                .entries
                .iter()
                .filter(|e| e.date == today_str)
                .cloned()
                .collect();
            CurrentMealPlan {
                plan,
                today: todays_entries,
            }
        });

        Ok(DashboardSummary {
            profile,
            meal_plan,
            shopping_list,
            expiring_inventory,
            counts,
        })
    }

    async fn dashboard_counts(&self, user_id: &str, today: NaiveDate) -> Result<DashboardCounts, AppError> {
        let (recipes, inventory_items, staples_due, open_shopping_lists) = tokio::try_join!(
            self.count_recipes(user_id),
            self.count_inventory(user_id),
            self.count_due_staples(user_id, today),
            self.count_open_lists(user_id),
        )?;
        Ok(DashboardCounts {
            recipes,
            inventory_items,
            staples_due,
            open_shopping_lists,
        })
    }
}
