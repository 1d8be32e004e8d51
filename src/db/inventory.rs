//! Household inventory persistence.

use chrono::{Duration, NaiveDate};
use sqlx::{sqlite::SqliteRow, Row};

use super::repository::{ensure_owner, format_date, new_id, non_blank, now, Repository};
use crate::errors::AppError;
use crate::grocery::units::canonical_unit;
use crate::models::{
    CreateInventoryItemRequest, InventoryItem, StorageLocation, UpdateInventoryItemRequest,
};

pub(super) const INVENTORY_COLUMNS: &str = "id, user_id, name, quantity, unit, category, location, expiry_date, notes, created_at, updated_at";

impl Repository {
    pub async fn list_inventory(&self, user_id: &str) -> Result<Vec<InventoryItem>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM inventory_items WHERE user_id = ? ORDER BY name COLLATE NOCASE",
            INVENTORY_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(inventory_from_row).collect())
    }

    /// Items with an expiry date between `today` and `today + days`, soonest first.
    pub async fn expiring_inventory(
        &self,
        user_id: &str,
        today: NaiveDate,
        days: i64,
    ) -> Result<Vec<InventoryItem>, AppError> {
        let rows = sqlx::query(&format!(
            r#"SELECT {} FROM inventory_items
               WHERE user_id = ? AND expiry_date IS NOT NULL
                 AND expiry_date >= ? AND expiry_date <= ?
               ORDER BY expiry_date, name COLLATE NOCASE"#,
            INVENTORY_COLUMNS
        ))
        .bind(user_id)
        .bind(format_date(today))
        .bind(format_date(today + Duration::days(days.max(0))))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(inventory_from_row).collect())
    }

    pub async fn count_inventory(&self, user_id: &str) -> Result<i64, AppError> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(*) FROM inventory_items WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    pub async fn get_inventory_item(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<InventoryItem, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM inventory_items WHERE id = ?",
            INVENTORY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        let item = row
            .as_ref()
            .map(inventory_from_row)
            .ok_or_else(|| AppError::not_found("Inventory item", id))?;
        ensure_owner(&item.user_id, user_id, "inventory item")?;
        Ok(item)
    }

    pub async fn create_inventory_item(
        &self,
        user_id: &str,
        request: &CreateInventoryItemRequest,
    ) -> Result<InventoryItem, AppError> {
        let now = now();
        let item = InventoryItem {
            id: new_id(),
            user_id: user_id.to_string(),
            name: request.name.trim().to_string(),
            quantity: request.quantity,
            unit: canonical_unit(&request.unit),
            category: non_blank(&request.category),
            location: request.location,
            expiry_date: non_blank(&request.expiry_date),
            notes: non_blank(&request.notes),
            created_at: now.clone(),
            updated_at: now,
        };

        sqlx::query(&format!(
            "INSERT INTO inventory_items ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            INVENTORY_COLUMNS
        ))
        .bind(&item.id)
        .bind(&item.user_id)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(&item.unit)
        .bind(&item.category)
        .bind(item.location.as_str())
        .bind(&item.expiry_date)
        .bind(&item.notes)
        .bind(&item.created_at)
        .bind(&item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    pub async fn update_inventory_item(
        &self,
        user_id: &str,
        id: &str,
        request: &UpdateInventoryItemRequest,
    ) -> Result<InventoryItem, AppError> {
        let existing = self.get_inventory_item(user_id, id).await?;
        let item = InventoryItem {
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
            location: request.location.unwrap_or(existing.location),
            expiry_date: if request.expiry_date.is_some() {
                non_blank(&request.expiry_date)
            } else {
                existing.expiry_date
            },
            notes: if request.notes.is_some() {
                non_blank(&request.notes)
            } else {
                existing.notes
            },
            updated_at: now(),
            ..existing
        };

        sqlx::query(
            r#"UPDATE inventory_items SET name = ?, quantity = ?, unit = ?, category = ?, location = ?,
                  expiry_date = ?, notes = ?, updated_at = ?
               WHERE id = ? AND user_id = ?"#,
        )
        .bind(&item.name)
        .bind(item.quantity)
        .bind(&item.unit)
        .bind(&item.category)
        .bind(item.location.as_str())
        .bind(&item.expiry_date)
        .bind(&item.notes)
        .bind(&item.updated_at)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    pub async fn delete_inventory_item(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        self.get_inventory_item(user_id, id).await?;
        sqlx::query("DELETE FROM inventory_items WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

pub(super) fn inventory_from_row(row: &SqliteRow) -> InventoryItem {
    let location: String = row.get("location");
    InventoryItem {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        quantity: row.get("quantity"),
        unit: row.get("unit"),
        category: row.get("category"),
        location: StorageLocation::parse(&location).unwrap_or_default(),
        expiry_date: row.get("expiry_date"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
