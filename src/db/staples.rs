//! Recurring staple persistence.

use chrono::NaiveDate;
use sqlx::{sqlite::SqliteRow, Row};

use super::repository::{ensure_owner, new_id, non_blank, now, Repository};
use crate::errors::AppError;
use crate::grocery::staples::{should_preselect, with_due};
use crate::grocery::units::canonical_unit;
use crate::models::{
    validate_schedule, CreateStapleRequest, Staple, StapleFrequency, StapleWithDue,
    UpdateStapleRequest,
};

pub(super) const STAPLE_COLUMNS: &str = "id, user_id, name, quantity, unit, category, frequency, custom_days, last_purchased_date, is_active, notes, created_at, updated_at";

impl Repository {
    pub async fn list_staples(&self, user_id: &str) -> Result<Vec<Staple>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM staples WHERE user_id = ? ORDER BY name COLLATE NOCASE",
            STAPLE_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(staple_from_row).collect())
    }

    pub async fn list_active_staples(&self, user_id: &str) -> Result<Vec<Staple>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM staples WHERE user_id = ? AND is_active = 1 ORDER BY name COLLATE NOCASE",
            STAPLE_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(staple_from_row).collect())
    }

    /// Active staples that are overdue, due today or due soon, most urgent first.
    pub async fn due_staples(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> Result<Vec<StapleWithDue>, AppError> {
        let mut due: Vec<StapleWithDue> = self
            .list_active_staples(user_id)
            .await?
            .into_iter()
            .map(|s| with_due(s, today))
            .filter(|s| should_preselect(s.due_status))
            .collect();
        due.sort_by_key(|s| s.days_until_due);
        Ok(due)
    }

    pub async fn count_due_staples(&self, user_id: &str, today: NaiveDate) -> Result<i64, AppError> {
        Ok(self.due_staples(user_id, today).await?.len() as i64)
    }

    pub async fn get_staple(&self, user_id: &str, id: &str) -> Result<Staple, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM staples WHERE id = ?", STAPLE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let staple = row
            .as_ref()
            .map(staple_from_row)
            .ok_or_else(|| AppError::not_found("Staple", id))?;
        ensure_owner(&staple.user_id, user_id, "staple")?;
        Ok(staple)
    }

    pub async fn create_staple(
        &self,
        user_id: &str,
        request: &CreateStapleRequest,
    ) -> Result<Staple, AppError> {
        let now = now();
        let staple = Staple {
            id: new_id(),
            user_id: user_id.to_string(),
            name: request.name.trim().to_string(),
            quantity: request.quantity,
            unit: canonical_unit(&request.unit),
            category: non_blank(&request.category),
            frequency: request.frequency,
            custom_days: request.custom_days,
            last_purchased_date: non_blank(&request.last_purchased_date),
            is_active: true,
            notes: non_blank(&request.notes),
            created_at: now.clone(),
            updated_at: now,
        };

        sqlx::query(&format!(
            "INSERT INTO staples ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?, ?)",
            STAPLE_COLUMNS
        ))
        .bind(&staple.id)
        .bind(&staple.user_id)
        .bind(&staple.name)
        .bind(staple.quantity)
        .bind(&staple.unit)
        .bind(&staple.category)
        .bind(staple.frequency.as_str())
        .bind(staple.custom_days)
        .bind(&staple.last_purchased_date)
        .bind(&staple.notes)
        .bind(&staple.created_at)
        .bind(&staple.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(staple)
    }

    pub async fn update_staple(
        &self,
        user_id: &str,
        id: &str,
        request: &UpdateStapleRequest,
    ) -> Result<Staple, AppError> {
        let existing = self.get_staple(user_id, id).await?;
        let frequency = request.frequency.unwrap_or(existing.frequency);
        let custom_days = match frequency {
            StapleFrequency::Custom => request.custom_days.or(existing.custom_days),
            _ => None,
        };
        validate_schedule(frequency, custom_days)?;

        let staple = Staple {
            name: request
                .name
                .as_deref()
                .map(|n| n.trim().to_string())
                .unwrap_or(existing.name),
            quantity: request.quantity.unwrap_or(existing.quantity),
            unit: request
                .unit
                .as_deref()
                .map(canonical_unit)
                .unwrap_or(existing.unit),
            category: if request.category.is_some() {
                non_blank(&request.category)
            } else {
                existing.category
            },
            frequency,
            custom_days,
            last_purchased_date: if request.last_purchased_date.is_some() {
                non_blank(&request.last_purchased_date)
            } else {
                existing.last_purchased_date
            },
            is_active: request.is_active.unwrap_or(existing.is_active),
            notes: if request.notes.is_some() {
                non_blank(&request.notes)
            } else {
                existing.notes
            },
            updated_at: now(),
            ..existing
        };

        sqlx::query(
            r#"UPDATE staples SET name = ?, quantity = ?, unit = ?, category = ?, frequency = ?, custom_days = ?,
                  last_purchased_date = ?, is_active = ?, notes = ?, updated_at = ?
               WHERE id = ? AND user_id = ?"#,
        )
        .bind(&staple.name)
        .bind(staple.quantity)
        .bind(&staple.unit)
        .bind(&staple.category)
        .bind(staple.frequency.as_str())
        .bind(staple.custom_days)
        .bind(&staple.last_purchased_date)
        .bind(staple.is_active)
        .bind(&staple.notes)
        .bind(&staple.updated_at)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(staple)
    }

    pub async fn delete_staple(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        self.get_staple(user_id, id).await?;
        sqlx::query("DELETE FROM staples WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

pub(super) fn staple_from_row(row: &SqliteRow) -> Staple {
    let frequency: String = row.get("frequency");
    let is_active: i64 = row.get("is_active");
    Staple {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        quantity: row.get("quantity"),
        unit: row.get("unit"),
        category: row.get("category"),
        frequency: StapleFrequency::parse(&frequency).unwrap_or(StapleFrequency::Weekly),
        custom_days: row.get("custom_days"),
        last_purchased_date: row.get("last_purchased_date"),
        is_active: is_active != 0,
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
