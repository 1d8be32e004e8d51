//! Moving purchased list items into the household inventory.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::inventory::{inventory_from_row, INVENTORY_COLUMNS};
use super::repository::{format_date, new_id, now, Repository};
use super::shopping_lists::{item_from_row, touch_list, ITEM_COLUMNS};
use crate::errors::AppError;
use crate::grocery::normalize::name_key;
use crate::grocery::units::{convert, round2};
use crate::models::{
    ConvertAction, ConvertPreviewItem, ConvertResult, ConvertToInventoryRequest, InventoryItem,
    InventoryMatch, ItemSource, ListStatus, ShoppingListItem, StorageLocation,
};

/// Inventory row a purchased item can be merged into, and the quantity in its unit.
fn find_match<'a>(
    item: &ShoppingListItem,
    inventory: &'a [InventoryItem],
) -> Option<(usize, &'a InventoryItem, f64)> {
    let key = name_key(&item.name);
    inventory.iter().enumerate().find_map(|(index, inv)| {
        if name_key(&inv.name) != key {
            return None;
        }
        convert(item.quantity, &item.unit, &inv.unit).map(|q| (index, inv, q))
    })
}

impl Repository {
    /// What converting each purchased item would do.
    pub async fn convert_preview(
        &self,
        user_id: &str,
        list_id: &str,
    ) -> Result<Vec<ConvertPreviewItem>, AppError> {
        self.get_shopping_list(user_id, list_id).await?;
        let inventory = self.list_inventory(user_id).await?;

        Ok(self
            .list_items(list_id)
            .await?
            .into_iter()
            .filter(|item| item.is_purchased)
            .map(|item| {
                let existing = find_match(&item, &inventory).map(|(_, inv, _)| InventoryMatch {
                    id: inv.id.clone(),
                    name: inv.name.clone(),
                    quantity: inv.quantity,
                    unit: inv.unit.clone(),
                });
                ConvertPreviewItem {
                    item_id: item.id,
                    name: item.name,
                    quantity: item.quantity,
                    unit: item.unit,
                    category: item.category,
                    action: if existing.is_some() {
                        ConvertAction::Merge
                    } else {
                        ConvertAction::Create
                    },
                    existing,
                }
            })
            .collect())
    }

    /// Move purchased items of a finalized list into the inventory in one transaction.
    pub async fn convert_to_inventory(
        &self,
        user_id: &str,
        list_id: &str,
        request: &ConvertToInventoryRequest,
        today: NaiveDate,
    ) -> Result<ConvertResult, AppError> {
        let list = self.get_shopping_list(user_id, list_id).await?;
        if list.status != ListStatus::Finalized {
            return Err(AppError::InvalidState(
                "Only finalized lists can be converted to inventory".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;
        touch_list(&mut *tx, list_id).await?;

        let rows = sqlx::query(&format!(
            "SELECT {} FROM shopping_list_items WHERE list_id = ? AND is_purchased = 1 ORDER BY display_order",
            ITEM_COLUMNS
        ))
        .bind(list_id)
        .fetch_all(&mut *tx)
        .await?;
        let items: Vec<ShoppingListItem> = rows
            .iter()
            .map(item_from_row)
            .filter(|item| match &request.item_ids {
                Some(ids) => ids.contains(&item.id),
                None => true,
            })
            .collect();

        let rows = sqlx::query(&format!(
            "SELECT {} FROM inventory_items WHERE user_id = ?",
            INVENTORY_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;
        let mut inventory: Vec<InventoryItem> = rows.iter().map(inventory_from_row).collect();

        let now = now();
        let mut created = 0i64;
        let mut merged = 0i64;
        let mut staple_ids = BTreeSet::new();

        for item in &items {
            let matched = if request.merge_with_existing {
                find_match(item, &inventory).map(|(index, _, quantity)| (index, quantity))
            } else {
                None
            };

            match matched {
                Some((index, quantity)) => {
                    let inv = &mut inventory[index];
                    inv.quantity = round2(inv.quantity + quantity);
                    inv.updated_at = now.clone();
                    sqlx::query("UPDATE inventory_items SET quantity = ?, updated_at = ? WHERE id = ?")
                        .bind(inv.quantity)
                        .bind(&now)
                        .bind(&inv.id)
                        .execute(&mut *tx)
                        .await?;
                    merged += 1;
                }
                None => {
                    let inv = InventoryItem {
                        id: new_id(),
                        user_id: user_id.to_string(),
                        name: item.name.clone(),
                        quantity: item.quantity,
                        unit: item.unit.clone(),
                        category: item.category.clone(),
                        location: StorageLocation::default(),
                        expiry_date: None,
                        notes: None,
                        created_at: now.clone(),
                        updated_at: now.clone(),
                    };
                    sqlx::query(&format!(
                        "INSERT INTO inventory_items ({}) VALUES (?, ?, ?, ?, ?, ?, ?, NULL, NULL, ?, ?)",
                        INVENTORY_COLUMNS
                    ))
                    .bind(&inv.id)
                    .bind(user_id)
                    .bind(&inv.name)
                    .bind(inv.quantity)
                    .bind(&inv.unit)
                    .bind(&inv.category)
                    .bind(inv.location.as_str())
                    .bind(&inv.created_at)
                    .bind(&inv.updated_at)
                    .execute(&mut *tx)
                    .await?;
                    inventory.push(inv);
                    created += 1;
                }
            }

            sqlx::query("DELETE FROM shopping_list_items WHERE id = ?")
                .bind(&item.id)
                .execute(&mut *tx)
                .await?;

            staple_ids.extend(
                item.source_details
                    .iter()
                    .filter(|d| d.kind == ItemSource::Staple)
                    .filter_map(|d| d.ref_id.clone()),
            );
        }

        let mut staple_updates = 0i64;
        for staple_id in &staple_ids {
            let result = sqlx::query(
                "UPDATE staples SET last_purchased_date = ?, updated_at = ? WHERE id = ? AND user_id = ?",
            )
            .bind(format_date(today))
            .bind(&now)
            .bind(staple_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
            staple_updates += result.rows_affected() as i64;
        }

        if request.archive_list {
            sqlx::query(
                "UPDATE shopping_lists SET status = 'archived', archived_at = ?, updated_at = ? WHERE id = ?",
            )
            .bind(&now)
            .bind(&now)
            .bind(list_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            list_id = %list_id,
            created,
            merged,
            staple_updates,
            archived = request.archive_list,
            "Converted purchased items to inventory"
        );

        Ok(ConvertResult {
            created,
            merged,
            staple_updates,
            archived: request.archive_list,
        })
    }
}
