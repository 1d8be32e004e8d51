//! Transactional merging of duplicate shopping-list items.

use super::repository::{now, to_json, Repository};
use super::shopping_lists::{item_from_row, touch_list, ITEM_COLUMNS};
use crate::errors::AppError;
use crate::grocery::dedup::{
    combine_items, find_duplicate_groups, merged_source_details, CombinedQuantity,
};
use crate::grocery::normalize::name_key;
use crate::grocery::units::{canonical_unit, round2};
use crate::models::{CombineAllResult, GroupFailure, MergeResult, MergedItem, ShoppingListItem};

impl Repository {
    /// Merge items of a list into the one with the lowest display order.
    ///
    /// The combined value is `resolution` when given, the direct sum of the
    /// items otherwise. Ids that no longer exist are skipped; fewer than two
    /// surviving ids is a no-op, so a retry after a concurrent merge succeeds.
    /// Every found item must be unpurchased and share the survivor's name key.
    pub async fn merge_items(
        &self,
        user_id: &str,
        list_id: &str,
        item_ids: &[String],
        resolution: Option<CombinedQuantity>,
        name: Option<&str>,
    ) -> Result<MergeResult, AppError> {
        self.get_mutable_list(user_id, list_id).await?;

        let mut tx = self.pool.begin().await?;
        // Writing first takes the write lock before any snapshot is read.
        touch_list(&mut *tx, list_id).await?;

        let previous_item_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM shopping_list_items WHERE list_id = ?")
                .bind(list_id)
                .fetch_one(&mut *tx)
                .await?;

        let mut found: Vec<ShoppingListItem> = Vec::with_capacity(item_ids.len());
        for id in item_ids {
            if found.iter().any(|i| &i.id == id) {
                continue;
            }
            let row = sqlx::query(&format!(
                "SELECT {} FROM shopping_list_items WHERE id = ? AND list_id = ?",
                ITEM_COLUMNS
            ))
            .bind(id)
            .bind(list_id)
            .fetch_optional(&mut *tx)
            .await?;
            if let Some(row) = row {
                found.push(item_from_row(&row));
            }
        }

        if found.len() < 2 {
            tx.commit().await?;
            tracing::debug!(list_id = %list_id, found = found.len(), "Nothing to merge");
            return Ok(MergeResult {
                previous_item_count,
                new_item_count: previous_item_count,
                deleted_count: 0,
                merged_item: found.first().map(|i| MergedItem {
                    id: i.id.clone(),
                    name: i.name.clone(),
                    quantity: i.quantity,
                    unit: i.unit.clone(),
                }),
            });
        }

        found.sort_by_key(|i| i.display_order);
        if found.iter().any(|i| i.is_purchased) {
            return Err(AppError::BadRequest(
                "Purchased items cannot be merged".to_string(),
            ));
        }
        let key = name_key(&found[0].name);
        if found[1..].iter().any(|i| name_key(&i.name) != key) {
            return Err(AppError::BadRequest(
                "Only items with the same name can be merged".to_string(),
            ));
        }
        let refs: Vec<&ShoppingListItem> = found.iter().collect();

        let combined = match resolution {
            Some(r) => CombinedQuantity {
                quantity: round2(r.quantity),
                unit: canonical_unit(&r.unit),
            },
            None => combine_items(&refs).map(CombinedQuantity::from).ok_or_else(|| {
                AppError::BadRequest(
                    "These items have units that cannot be combined; provide a quantity and unit"
                        .to_string(),
                )
            })?,
        };

        let survivor = refs[0];
        let merged_name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(survivor.name.as_str())
            .to_string();
        let details = merged_source_details(&refs);

        sqlx::query(
            r#"UPDATE shopping_list_items SET name = ?, quantity = ?, unit = ?, source_details = ?,
                  is_consolidated = 1, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(&merged_name)
        .bind(combined.quantity)
        .bind(&combined.unit)
        .bind(to_json(&details)?)
        .bind(now())
        .bind(&survivor.id)
        .execute(&mut *tx)
        .await?;

        let mut deleted_count = 0i64;
        for item in &refs[1..] {
            let result = sqlx::query("DELETE FROM shopping_list_items WHERE id = ?")
                .bind(&item.id)
                .execute(&mut *tx)
                .await?;
            deleted_count += result.rows_affected() as i64;
        }

        tx.commit().await?;

        tracing::info!(
            list_id = %list_id,
            survivor = %survivor.id,
            deleted = deleted_count,
            "Merged duplicate items"
        );

        Ok(MergeResult {
            previous_item_count,
            new_item_count: previous_item_count - deleted_count,
            deleted_count,
            merged_item: Some(MergedItem {
                id: survivor.id.clone(),
                name: merged_name,
                quantity: combined.quantity,
                unit: combined.unit,
            }),
        })
    }

    /// Merge every directly combinable group, each in its own transaction.
    pub async fn combine_all_duplicates(
        &self,
        user_id: &str,
        list_id: &str,
    ) -> Result<CombineAllResult, AppError> {
        self.get_mutable_list(user_id, list_id).await?;
        let items = self.list_items(list_id).await?;

        let mut result = CombineAllResult {
            groups_merged: 0,
            total_deleted: 0,
            skipped_groups: 0,
            failures: Vec::new(),
        };

        for group in find_duplicate_groups(&items) {
            if group.requires_resolution {
                result.skipped_groups += 1;
                continue;
            }
            match self
                .merge_items(user_id, list_id, &group.item_ids(), None, None)
                .await
            {
                Ok(merge) => {
                    result.groups_merged += 1;
                    result.total_deleted += merge.deleted_count;
                }
                Err(e) => {
                    tracing::warn!(list_id = %list_id, key = %group.key, "Group merge failed: {}", e);
                    result.failures.push(GroupFailure {
                        key: group.key,
                        error: e.message(),
                    });
                }
            }
        }

        Ok(result)
    }
}
