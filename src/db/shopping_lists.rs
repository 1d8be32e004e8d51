//! Shopping list and list item persistence.
//!
//! Lists move forward only (draft, finalized, archived). Archived lists and
//! their items reject every write, and purchase flags only change while a
//! list is finalized.

use sqlx::{sqlite::SqliteRow, Executor, Row, Sqlite};

use super::repository::{
    ensure_owner, new_id, non_blank, now, parse_json_array, parse_source_details, to_json,
    Repository,
};
use crate::errors::AppError;
use crate::grocery::categories::suggest_from;
use crate::grocery::units::canonical_unit;
use crate::models::{
    CreateItemRequest, CreateShoppingListRequest, ItemSource, ListStatus, ShoppingList,
    ShoppingListDetail, ShoppingListItem, SourceDetail, UpdateItemRequest,
    UpdateShoppingListRequest,
};

const LIST_SELECT: &str = r#"SELECT l.id, l.user_id, l.name, l.notes, l.status, l.meal_plan_ids,
           l.created_at, l.updated_at, l.finalized_at, l.archived_at,
           (SELECT COUNT(*) FROM shopping_list_items i WHERE i.list_id = l.id) AS item_count,
           (SELECT COUNT(*) FROM shopping_list_items i WHERE i.list_id = l.id AND i.is_purchased = 1) AS purchased_count
    FROM shopping_lists l"#;

pub(super) const ITEM_COLUMNS: &str = "id, list_id, name, quantity, unit, category, source, source_details, is_purchased, is_consolidated, display_order, created_at, updated_at";

impl Repository {
    // ==================== LIST OPERATIONS ====================

    pub async fn list_shopping_lists(&self, user_id: &str) -> Result<Vec<ShoppingList>, AppError> {
        let rows = sqlx::query(&format!(
            "{} WHERE l.user_id = ? ORDER BY l.updated_at DESC",
            LIST_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(list_from_row).collect())
    }

    /// Most recently touched list that is not archived.
    pub async fn latest_open_list(&self, user_id: &str) -> Result<Option<ShoppingList>, AppError> {
        let row = sqlx::query(&format!(
            "{} WHERE l.user_id = ? AND l.status != 'archived' ORDER BY l.updated_at DESC LIMIT 1",
            LIST_SELECT
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(list_from_row))
    }

    pub async fn count_open_lists(&self, user_id: &str) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar(
            "SELECT COUNT(*) FROM shopping_lists WHERE user_id = ? AND status != 'archived'",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?)
    }

    pub async fn get_shopping_list(&self, user_id: &str, id: &str) -> Result<ShoppingList, AppError> {
        let row = sqlx::query(&format!("{} WHERE l.id = ?", LIST_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let list = row
            .as_ref()
            .map(list_from_row)
            .ok_or_else(|| AppError::not_found("Shopping list", id))?;
        ensure_owner(&list.user_id, user_id, "shopping list")?;
        Ok(list)
    }

    /// Load a list the caller owns and may still modify.
    pub async fn get_mutable_list(&self, user_id: &str, id: &str) -> Result<ShoppingList, AppError> {
        let list = self.get_shopping_list(user_id, id).await?;
        ensure_mutable(&list)?;
        Ok(list)
    }

    pub async fn get_shopping_list_detail(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<ShoppingListDetail, AppError> {
        let list = self.get_shopping_list(user_id, id).await?;
        let items = self.list_items(id).await?;
        Ok(ShoppingListDetail { list, items })
    }

    pub async fn create_shopping_list(
        &self,
        user_id: &str,
        request: &CreateShoppingListRequest,
    ) -> Result<ShoppingList, AppError> {
        let now = now();
        let list = ShoppingList {
            id: new_id(),
            user_id: user_id.to_string(),
            name: request.name.trim().to_string(),
            notes: non_blank(&request.notes),
            status: ListStatus::Draft,
            meal_plan_ids: Vec::new(),
            item_count: 0,
            purchased_count: 0,
            created_at: now.clone(),
            updated_at: now,
            finalized_at: None,
            archived_at: None,
        };

        sqlx::query(
            "INSERT INTO shopping_lists (id, user_id, name, notes, status, meal_plan_ids, created_at, updated_at) VALUES (?, ?, ?, ?, ?, '[]', ?, ?)",
        )
        .bind(&list.id)
        .bind(user_id)
        .bind(&list.name)
        .bind(&list.notes)
        .bind(list.status.as_str())
        .bind(&list.created_at)
        .bind(&list.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(list)
    }

    /// Rename a list, edit its notes or move its status forward.
    pub async fn update_shopping_list(
        &self,
        user_id: &str,
        id: &str,
        request: &UpdateShoppingListRequest,
    ) -> Result<ShoppingList, AppError> {
        let list = self.get_mutable_list(user_id, id).await?;
        let now = now();

        let mut finalized_at = list.finalized_at.clone();
        let mut archived_at = list.archived_at.clone();
        let status = match request.status {
            Some(next) if next == list.status => list.status,
            Some(next) => {
                if !list.status.can_transition_to(next) {
                    return Err(AppError::InvalidState(format!(
                        "Cannot move a {} list back to {}",
                        list.status.as_str(),
                        next.as_str()
                    )));
                }
                if next >= ListStatus::Finalized && finalized_at.is_none() {
                    finalized_at = Some(now.clone());
                }
                if next == ListStatus::Archived {
                    archived_at = Some(now.clone());
                }
                next
            }
            None => list.status,
        };

        let name = request
            .name
            .as_deref()
            .map(|n| n.trim().to_string())
            .unwrap_or(list.name);
        let notes = if request.notes.is_some() {
            non_blank(&request.notes)
        } else {
            list.notes
        };

        sqlx::query(
            r#"UPDATE shopping_lists SET name = ?, notes = ?, status = ?, finalized_at = ?, archived_at = ?, updated_at = ?
               WHERE id = ? AND user_id = ?"#,
        )
        .bind(&name)
        .bind(&notes)
        .bind(status.as_str())
        .bind(&finalized_at)
        .bind(&archived_at)
        .bind(&now)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if status != list.status {
            tracing::info!(list_id = %id, from = list.status.as_str(), to = status.as_str(), "Shopping list status changed");
        }

        self.get_shopping_list(user_id, id).await
    }

    /// Delete a list with its items and exclusions. Allowed in every status.
    pub async fn delete_shopping_list(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        self.get_shopping_list(user_id, id).await?;
        sqlx::query("DELETE FROM shopping_lists WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ==================== ITEM OPERATIONS ====================

    pub async fn list_items(&self, list_id: &str) -> Result<Vec<ShoppingListItem>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM shopping_list_items WHERE list_id = ? ORDER BY display_order, created_at",
            ITEM_COLUMNS
        ))
        .bind(list_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(item_from_row).collect())
    }

    async fn get_item(&self, list_id: &str, item_id: &str) -> Result<ShoppingListItem, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM shopping_list_items WHERE id = ? AND list_id = ?",
            ITEM_COLUMNS
        ))
        .bind(item_id)
        .bind(list_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref()
            .map(item_from_row)
            .ok_or_else(|| AppError::not_found("Item", item_id))
    }

    /// Add an item typed in by hand at the end of the list.
    pub async fn add_item(
        &self,
        user_id: &str,
        list_id: &str,
        request: &CreateItemRequest,
    ) -> Result<ShoppingListItem, AppError> {
        self.get_mutable_list(user_id, list_id).await?;

        let name = request.name.trim().to_string();
        let unit = canonical_unit(&request.unit);
        let display_order = next_display_order(&self.pool, list_id).await?;
        let item = new_item(
            list_id,
            NewItem {
                name: name.clone(),
                quantity: request.quantity,
                unit: unit.clone(),
                category: non_blank(&request.category),
                source: ItemSource::Manual,
                source_details: vec![SourceDetail {
                    kind: ItemSource::Manual,
                    ref_id: None,
                    label: name,
                    meal_plan_id: None,
                    quantity: request.quantity,
                    unit,
                }],
            },
            display_order,
        );

        insert_item(&self.pool, &item).await?;
        self.touch_list(list_id).await?;
        Ok(item)
    }

    /// Edit an item. Purchase toggles require a finalized list.
    pub async fn update_item(
        &self,
        user_id: &str,
        list_id: &str,
        item_id: &str,
        request: &UpdateItemRequest,
    ) -> Result<ShoppingListItem, AppError> {
        let list = self.get_mutable_list(user_id, list_id).await?;
        let existing = self.get_item(list_id, item_id).await?;

        if let Some(purchased) = request.is_purchased {
            if purchased != existing.is_purchased && list.status != ListStatus::Finalized {
                return Err(not_finalized());
            }
        }

        let item = ShoppingListItem {
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
            is_purchased: request.is_purchased.unwrap_or(existing.is_purchased),
            display_order: request.display_order.unwrap_or(existing.display_order),
            updated_at: now(),
            ..existing
        };

        sqlx::query(
            r#"UPDATE shopping_list_items SET name = ?, quantity = ?, unit = ?, category = ?, is_purchased = ?,
                  display_order = ?, updated_at = ?
               WHERE id = ? AND list_id = ?"#,
        )
        .bind(&item.name)
        .bind(item.quantity)
        .bind(&item.unit)
        .bind(&item.category)
        .bind(item.is_purchased)
        .bind(item.display_order)
        .bind(&item.updated_at)
        .bind(item_id)
        .bind(list_id)
        .execute(&self.pool)
        .await?;

        self.touch_list(list_id).await?;
        Ok(item)
    }

    /// Set the purchased flag of one item. Used by bulk purchase.
    pub async fn set_item_purchased(
        &self,
        user_id: &str,
        list_id: &str,
        item_id: &str,
        purchased: bool,
    ) -> Result<(), AppError> {
        let list = self.get_mutable_list(user_id, list_id).await?;
        if list.status != ListStatus::Finalized {
            return Err(not_finalized());
        }

        let result = sqlx::query(
            "UPDATE shopping_list_items SET is_purchased = ?, updated_at = ? WHERE id = ? AND list_id = ?",
        )
        .bind(purchased)
        .bind(now())
        .bind(item_id)
        .bind(list_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Item", item_id));
        }
        Ok(())
    }

    pub async fn delete_item(
        &self,
        user_id: &str,
        list_id: &str,
        item_id: &str,
    ) -> Result<(), AppError> {
        self.get_mutable_list(user_id, list_id).await?;
        let result = sqlx::query("DELETE FROM shopping_list_items WHERE id = ? AND list_id = ?")
            .bind(item_id)
            .bind(list_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Item", item_id));
        }
        self.touch_list(list_id).await
    }

    /// Fill in a category for every uncategorized item from the user's categories.
    pub async fn suggest_item_categories(
        &self,
        user_id: &str,
        list_id: &str,
    ) -> Result<Vec<ShoppingListItem>, AppError> {
        self.get_mutable_list(user_id, list_id).await?;
        let categories = self.category_names(user_id).await?;
        let items = self.list_items(list_id).await?;
        let now = now();

        let mut tx = self.pool.begin().await?;
        let mut updated = Vec::new();
        for mut item in items {
            if item.category.is_some() {
                continue;
            }
            let Some(category) = suggest_from(&item.name, &categories) else {
                continue;
            };
            sqlx::query("UPDATE shopping_list_items SET category = ?, updated_at = ? WHERE id = ?")
                .bind(&category)
                .bind(&now)
                .bind(&item.id)
                .execute(&mut *tx)
                .await?;
            item.category = Some(category);
            item.updated_at = now.clone();
            updated.push(item);
        }
        tx.commit().await?;

        tracing::debug!(list_id = %list_id, count = updated.len(), "Suggested item categories");
        Ok(updated)
    }

    pub(super) async fn touch_list(&self, list_id: &str) -> Result<(), AppError> {
        touch_list(&self.pool, list_id).await
    }
}

/// Field values of an item about to be inserted.
pub(super) struct NewItem {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub category: Option<String>,
    pub source: ItemSource,
    pub source_details: Vec<SourceDetail>,
}

pub(super) fn new_item(list_id: &str, fields: NewItem, display_order: i64) -> ShoppingListItem {
    let now = now();
    ShoppingListItem {
        id: new_id(),
        list_id: list_id.to_string(),
        name: fields.name,
        quantity: fields.quantity,
        unit: fields.unit,
        category: fields.category,
        source: fields.source,
        source_details: fields.source_details,
        is_purchased: false,
        is_consolidated: false,
        display_order,
        created_at: now.clone(),
        updated_at: now,
    }
}

pub(super) fn ensure_mutable(list: &ShoppingList) -> Result<(), AppError> {
    if list.status == ListStatus::Archived {
        return Err(AppError::InvalidState(
            "Archived shopping lists cannot be modified".to_string(),
        ));
    }
    Ok(())
}

fn not_finalized() -> AppError {
    AppError::InvalidState(
        "Items can only be marked purchased on a finalized list".to_string(),
    )
}

pub(super) async fn next_display_order<'e, E>(executor: E, list_id: &str) -> Result<i64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    Ok(sqlx::query_scalar(
        "SELECT COALESCE(MAX(display_order) + 1, 0) FROM shopping_list_items WHERE list_id = ?",
    )
    .bind(list_id)
    .fetch_one(executor)
    .await?)
}

pub(super) async fn insert_item<'e, E>(executor: E, item: &ShoppingListItem) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(&format!(
        "INSERT INTO shopping_list_items ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        ITEM_COLUMNS
    ))
    .bind(&item.id)
    .bind(&item.list_id)
    .bind(&item.name)
    .bind(item.quantity)
    .bind(&item.unit)
    .bind(&item.category)
    .bind(item.source.as_str())
    .bind(to_json(&item.source_details)?)
    .bind(item.is_purchased)
    .bind(item.is_consolidated)
    .bind(item.display_order)
    .bind(&item.created_at)
    .bind(&item.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub(super) async fn touch_list<'e, E>(executor: E, list_id: &str) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE shopping_lists SET updated_at = ? WHERE id = ?")
        .bind(now())
        .bind(list_id)
        .execute(executor)
        .await?;
    Ok(())
}

fn list_from_row(row: &SqliteRow) -> ShoppingList {
    let status: String = row.get("status");
    let meal_plan_ids: String = row.get("meal_plan_ids");
    ShoppingList {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        notes: row.get("notes"),
        status: ListStatus::parse(&status).unwrap_or(ListStatus::Draft),
        meal_plan_ids: parse_json_array(&meal_plan_ids),
        item_count: row.get("item_count"),
        purchased_count: row.get("purchased_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        finalized_at: row.get("finalized_at"),
        archived_at: row.get("archived_at"),
    }
}

pub(super) fn item_from_row(row: &SqliteRow) -> ShoppingListItem {
    let source: String = row.get("source");
    let details: String = row.get("source_details");
    let is_purchased: i64 = row.get("is_purchased");
    let is_consolidated: i64 = row.get("is_consolidated");
    ShoppingListItem {
        id: row.get("id"),
        list_id: row.get("list_id"),
        name: row.get("name"),
        quantity: row.get("quantity"),
        unit: row.get("unit"),
        category: row.get("category"),
        source: ItemSource::parse(&source).unwrap_or(ItemSource::Manual),
        source_details: parse_source_details(&details),
        is_purchased: is_purchased != 0,
        is_consolidated: is_consolidated != 0,
        display_order: row.get("display_order"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
