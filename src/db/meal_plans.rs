//! Weekly meal plan persistence.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use sqlx::{sqlite::SqliteRow, Row, Sqlite, Transaction};

use super::repository::{ensure_owner, format_date, new_id, non_blank, now, Repository};
use crate::errors::AppError;
use crate::models::{
    CreateMealPlanRequest, EntryInput, MealPlan, MealPlanEntry, MealPlanStatus, MealType,
    UpdateMealPlanRequest,
};

const PLAN_COLUMNS: &str = "id, user_id, name, week_start_date, status, notes, created_at, updated_at";

const ENTRY_SELECT: &str = r#"SELECT e.id, e.meal_plan_id, e.date, e.meal_type, e.recipe_id,
           e.custom_name, e.servings, e.notes, r.name AS recipe_name
    FROM meal_plan_entries e LEFT JOIN recipes r ON r.id = e.recipe_id"#;

const ENTRY_ORDER: &str = "ORDER BY e.date, CASE e.meal_type WHEN 'breakfast' THEN 0 WHEN 'lunch' THEN 1 WHEN 'dinner' THEN 2 ELSE 3 END";

impl Repository {
    pub async fn list_meal_plans(&self, user_id: &str) -> Result<Vec<MealPlan>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM meal_plans WHERE user_id = ? ORDER BY week_start_date DESC, created_at DESC",
            PLAN_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let entry_rows = sqlx::query(&format!(
            "{} JOIN meal_plans p ON p.id = e.meal_plan_id WHERE p.user_id = ? {}",
            ENTRY_SELECT, ENTRY_ORDER
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_plan: HashMap<String, Vec<MealPlanEntry>> = HashMap::new();
        for row in &entry_rows {
            by_plan
                .entry(row.get("meal_plan_id"))
                .or_default()
                .push(entry_from_row(row));
        }

        Ok(rows
            .iter()
            .map(|row| {
                let mut plan = plan_from_row(row);
                plan.entries = by_plan.remove(&plan.id).unwrap_or_default();
                plan
            })
            .collect())
    }

    pub async fn get_meal_plan(&self, user_id: &str, id: &str) -> Result<MealPlan, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM meal_plans WHERE id = ?", PLAN_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let mut plan = row
            .as_ref()
            .map(plan_from_row)
            .ok_or_else(|| AppError::not_found("Meal plan", id))?;
        ensure_owner(&plan.user_id, user_id, "meal plan")?;
        plan.entries = self.load_entries(id).await?;
        Ok(plan)
    }

    async fn load_entries(&self, plan_id: &str) -> Result<Vec<MealPlanEntry>, AppError> {
        let rows = sqlx::query(&format!(
            "{} WHERE e.meal_plan_id = ? {}",
            ENTRY_SELECT, ENTRY_ORDER
        ))
        .bind(plan_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(entry_from_row).collect())
    }

    /// The plan whose week contains `today`, preferring active plans.
    pub async fn current_meal_plan(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> Result<Option<MealPlan>, AppError> {
        let id: Option<String> = sqlx::query_scalar(
            r#"SELECT id FROM meal_plans
               WHERE user_id = ? AND status != 'completed'
                 AND week_start_date <= ? AND week_start_date >= ?
               ORDER BY status = 'active' DESC, updated_at DESC
               LIMIT 1"#,
        )
        .bind(user_id)
        .bind(format_date(today))
        .bind(format_date(today - Duration::days(6)))
        .fetch_optional(&self.pool)
        .await?;

        match id {
            Some(id) => Ok(Some(self.get_meal_plan(user_id, &id).await?)),
            None => Ok(None),
        }
    }

    pub async fn create_meal_plan(
        &self,
        user_id: &str,
        request: &CreateMealPlanRequest,
    ) -> Result<MealPlan, AppError> {
        let id = new_id();
        let now = now();
        let status = request.status.unwrap_or(MealPlanStatus::Draft);
        let notes = non_blank(&request.notes);

        let mut tx = self.pool.begin().await?;
        sqlx::query(&format!(
            "INSERT INTO meal_plans ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            PLAN_COLUMNS
        ))
        .bind(&id)
        .bind(user_id)
        .bind(request.name.trim())
        .bind(request.week_start_date.trim())
        .bind(status.as_str())
        .bind(&notes)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        insert_entries(&mut tx, user_id, &id, &request.entries).await?;
        tx.commit().await?;

        self.get_meal_plan(user_id, &id).await
    }

    pub async fn update_meal_plan(
        &self,
        user_id: &str,
        id: &str,
        request: &UpdateMealPlanRequest,
    ) -> Result<MealPlan, AppError> {
        let existing = self.get_meal_plan(user_id, id).await?;
        let name = request
            .name
            .as_deref()
            .map(|n| n.trim().to_string())
            .unwrap_or(existing.name);
        let status = request.status.unwrap_or(existing.status);
        let notes = if request.notes.is_some() {
            non_blank(&request.notes)
        } else {
            existing.notes
        };

        sqlx::query(
            "UPDATE meal_plans SET name = ?, status = ?, notes = ?, updated_at = ? WHERE id = ? AND user_id = ?",
        )
        .bind(&name)
        .bind(status.as_str())
        .bind(&notes)
        .bind(now())
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        self.get_meal_plan(user_id, id).await
    }

    /// Replace every entry of a plan in one transaction.
    pub async fn replace_entries(
        &self,
        user_id: &str,
        id: &str,
        entries: &[EntryInput],
    ) -> Result<MealPlan, AppError> {
        let plan = self.get_meal_plan(user_id, id).await?;
        let week_start = NaiveDate::parse_from_str(&plan.week_start_date, "%Y-%m-%d")
            .map_err(|e| AppError::Internal(format!("Corrupt week start date: {}", e)))?;
        for entry in entries {
            entry.validate(week_start)?;
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM meal_plan_entries WHERE meal_plan_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_entries(&mut tx, user_id, id, entries).await?;
        sqlx::query("UPDATE meal_plans SET updated_at = ? WHERE id = ?")
            .bind(now())
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        self.get_meal_plan(user_id, id).await
    }

    pub async fn delete_meal_plan(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        self.get_meal_plan(user_id, id).await?;
        sqlx::query("DELETE FROM meal_plans WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Insert entries, checking that every referenced recipe belongs to the user.
async fn insert_entries(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: &str,
    plan_id: &str,
    entries: &[EntryInput],
) -> Result<(), AppError> {
    for entry in entries {
        let recipe_id = entry
            .recipe_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());

        // The recipe name is kept as the entry title so the entry survives recipe deletion.
        let mut title = non_blank(&entry.custom_name);
        if let Some(recipe_id) = recipe_id {
            let row = sqlx::query("SELECT user_id, name FROM recipes WHERE id = ?")
                .bind(recipe_id)
                .fetch_optional(&mut **tx)
                .await?
                .ok_or_else(|| AppError::Validation(format!("Recipe {} not found", recipe_id)))?;
            let owner: String = row.get("user_id");
            ensure_owner(&owner, user_id, "recipe")?;
            if title.is_none() {
                title = Some(row.get("name"));
            }
        }

        sqlx::query(
            "INSERT INTO meal_plan_entries (id, meal_plan_id, date, meal_type, recipe_id, custom_name, servings, notes) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(new_id())
        .bind(plan_id)
        .bind(entry.date.trim())
        .bind(entry.meal_type.as_str())
        .bind(recipe_id)
        .bind(&title)
        .bind(entry.servings)
        .bind(non_blank(&entry.notes))
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

fn plan_from_row(row: &SqliteRow) -> MealPlan {
    let status: String = row.get("status");
    MealPlan {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        week_start_date: row.get("week_start_date"),
        status: MealPlanStatus::parse(&status).unwrap_or(MealPlanStatus::Draft),
        notes: row.get("notes"),
        entries: Vec::new(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn entry_from_row(row: &SqliteRow) -> MealPlanEntry {
    let meal_type: String = row.get("meal_type");
    let recipe_name: Option<String> = row.get("recipe_name");
    let custom_name: Option<String> = row.get("custom_name");
    MealPlanEntry {
        id: row.get("id"),
        date: row.get("date"),
        meal_type: MealType::parse(&meal_type).unwrap_or(MealType::Dinner),
        recipe_id: row.get("recipe_id"),
        title: recipe_name
            .or(custom_name)
            .unwrap_or_else(|| "Meal".to_string()),
        servings: row.get("servings"),
        notes: row.get("notes"),
    }
}
