//! Staple and meal-plan imports into a shopping list, and excluded lines.

use chrono::NaiveDate;
use sqlx::{sqlite::SqliteRow, Row};

use super::repository::{new_id, now, parse_source_details, to_json, Repository};
use super::shopping_lists::{
    insert_item, item_from_row, new_item, next_display_order, touch_list, NewItem, ITEM_COLUMNS,
};
use super::staples::{staple_from_row, STAPLE_COLUMNS};
use crate::errors::AppError;
use crate::grocery::aggregate::{plan_import_lines, ImportLine, LineStatus, MealPlanImportPreview};
use crate::grocery::normalize::name_key;
use crate::grocery::staples::{should_preselect, with_due};
use crate::grocery::units::{combinable, sum_quantities};
use crate::models::{
    ExcludedItem, ItemSource, MealPlanImportRequest, MealPlanImportResult, ShoppingListItem,
    SourceDetail, StapleImportCandidate, StapleImportResult,
};

const EXCLUDED_COLUMNS: &str = "id, list_id, name, required_quantity, required_unit, inventory_quantity, inventory_unit, source_details, added_back_at, created_at";

impl Repository {
    // ==================== STAPLE IMPORT ====================

    /// Active staples with due status and whether the list already holds them.
    pub async fn staple_import_candidates(
        &self,
        user_id: &str,
        list_id: &str,
        today: NaiveDate,
    ) -> Result<Vec<StapleImportCandidate>, AppError> {
        self.get_shopping_list(user_id, list_id).await?;
        let items = self.list_items(list_id).await?;

        let mut candidates: Vec<StapleImportCandidate> = self
            .list_active_staples(user_id)
            .await?
            .into_iter()
            .map(|staple| {
                let already_imported = references_staple(&items, &staple.id);
                let staple = with_due(staple, today);
                let selected = !already_imported && should_preselect(staple.due_status);
                StapleImportCandidate {
                    staple,
                    already_imported,
                    selected,
                }
            })
            .collect();
        candidates.sort_by_key(|c| c.staple.days_until_due);
        Ok(candidates)
    }

    /// Add the chosen staples that are not on the list yet.
    pub async fn import_staples(
        &self,
        user_id: &str,
        list_id: &str,
        staple_ids: &[String],
    ) -> Result<StapleImportResult, AppError> {
        self.get_mutable_list(user_id, list_id).await?;

        let mut tx = self.pool.begin().await?;
        touch_list(&mut *tx, list_id).await?;
        let rows = sqlx::query(&format!(
            "SELECT {} FROM shopping_list_items WHERE list_id = ?",
            ITEM_COLUMNS
        ))
        .bind(list_id)
        .fetch_all(&mut *tx)
        .await?;
        let mut items: Vec<ShoppingListItem> = rows.iter().map(item_from_row).collect();
        let mut display_order = next_display_order(&mut *tx, list_id).await?;
        let mut added = Vec::new();
        let mut skipped = Vec::new();

        for staple_id in staple_ids {
            let row = sqlx::query(&format!(
                "SELECT {} FROM staples WHERE id = ? AND user_id = ?",
                STAPLE_COLUMNS
            ))
            .bind(staple_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;

            let staple = match row {
                Some(row) => staple_from_row(&row),
                None => {
                    skipped.push(staple_id.clone());
                    continue;
                }
            };
            if references_staple(&items, &staple.id) {
                skipped.push(staple_id.clone());
                continue;
            }

            let item = new_item(
                list_id,
                NewItem {
                    name: staple.name.clone(),
                    quantity: staple.quantity,
                    unit: staple.unit.clone(),
                    category: staple.category.clone(),
                    source: ItemSource::Staple,
                    source_details: vec![SourceDetail {
                        kind: ItemSource::Staple,
                        ref_id: Some(staple.id.clone()),
                        label: staple.name.clone(),
                        meal_plan_id: None,
                        quantity: staple.quantity,
                        unit: staple.unit.clone(),
                    }],
                },
                display_order,
            );
            insert_item(&mut *tx, &item).await?;
            display_order += 1;
            items.push(item.clone());
            added.push(item);
        }

        tx.commit().await?;

        tracing::info!(
            list_id = %list_id,
            added = added.len(),
            skipped = skipped.len(),
            "Imported staples"
        );
        Ok(StapleImportResult { added, skipped })
    }

    // ==================== MEAL PLAN IMPORT ====================

    /// Aggregated ingredient lines of a meal plan, without writing anything.
    pub async fn meal_plan_import_preview(
        &self,
        user_id: &str,
        list_id: &str,
        meal_plan_id: &str,
        check_inventory: bool,
    ) -> Result<MealPlanImportPreview, AppError> {
        self.get_shopping_list(user_id, list_id).await?;
        let plan = self.get_meal_plan(user_id, meal_plan_id).await?;
        let recipes = self.recipes_by_id(user_id).await?;
        let inventory = if check_inventory {
            Some(self.list_inventory(user_id).await?)
        } else {
            None
        };

        let lines = plan_import_lines(&plan, &recipes, inventory.as_deref());
        Ok(MealPlanImportPreview {
            meal_plan_id: plan.id,
            meal_plan_name: plan.name,
            lines,
        })
    }

    /// Write a meal plan's ingredients to the list in one transaction.
    ///
    /// Lines matching an unpurchased item with a combinable unit are folded
    /// into it; covered lines are recorded as exclusions.
    pub async fn import_meal_plan(
        &self,
        user_id: &str,
        list_id: &str,
        request: &MealPlanImportRequest,
    ) -> Result<MealPlanImportResult, AppError> {
        let list = self.get_mutable_list(user_id, list_id).await?;
        let preview = self
            .meal_plan_import_preview(
                user_id,
                list_id,
                &request.meal_plan_id,
                request.check_inventory,
            )
            .await?;

        let lines: Vec<ImportLine> = match &request.names {
            Some(names) => {
                let keys: Vec<String> = names.iter().map(|n| name_key(n)).collect();
                preview
                    .lines
                    .into_iter()
                    .filter(|l| keys.contains(&l.key))
                    .collect()
            }
            None => preview.lines,
        };

        let mut tx = self.pool.begin().await?;
        touch_list(&mut *tx, list_id).await?;
        let rows = sqlx::query(&format!(
            "SELECT {} FROM shopping_list_items WHERE list_id = ? AND is_purchased = 0 ORDER BY display_order",
            ITEM_COLUMNS
        ))
        .bind(list_id)
        .fetch_all(&mut *tx)
        .await?;
        let mut open_items: Vec<ShoppingListItem> = rows.iter().map(item_from_row).collect();
        let mut display_order = next_display_order(&mut *tx, list_id).await?;

        let now = now();
        let mut added = 0i64;
        let mut merged = 0i64;
        let mut excluded = Vec::new();

        for line in lines {
            if line.status == LineStatus::Excluded {
                let record = ExcludedItem {
                    id: new_id(),
                    list_id: list_id.to_string(),
                    name: line.name,
                    required_quantity: line.required_quantity,
                    required_unit: line.unit.clone(),
                    inventory_quantity: line.inventory_quantity.unwrap_or(0.0),
                    inventory_unit: line.inventory_unit.unwrap_or(line.unit),
                    source_details: line.source_details,
                    added_back_at: None,
                    created_at: now.clone(),
                };
                sqlx::query(&format!(
                    "INSERT INTO excluded_items ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, NULL, ?)",
                    EXCLUDED_COLUMNS
                ))
                .bind(&record.id)
                .bind(&record.list_id)
                .bind(&record.name)
                .bind(record.required_quantity)
                .bind(&record.required_unit)
                .bind(record.inventory_quantity)
                .bind(&record.inventory_unit)
                .bind(to_json(&record.source_details)?)
                .bind(&record.created_at)
                .execute(&mut *tx)
                .await?;
                excluded.push(record);
                continue;
            }

            let target = open_items
                .iter_mut()
                .find(|i| name_key(&i.name) == line.key && combinable(&i.unit, &line.unit));

            match target {
                Some(item) => {
                    let Some(sum) = sum_quantities([
                        (item.quantity, item.unit.as_str()),
                        (line.quantity, line.unit.as_str()),
                    ]) else {
                        continue;
                    };
                    item.quantity = sum.quantity;
                    item.unit = sum.unit;
                    item.source_details.extend(line.source_details);
                    item.is_consolidated = true;

                    sqlx::query(
                        r#"UPDATE shopping_list_items SET quantity = ?, unit = ?, source_details = ?,
                              is_consolidated = 1, updated_at = ?
                           WHERE id = ?"#,
                    )
                    .bind(item.quantity)
                    .bind(&item.unit)
                    .bind(to_json(&item.source_details)?)
                    .bind(&now)
                    .bind(&item.id)
                    .execute(&mut *tx)
                    .await?;
                    merged += 1;
                }
                None => {
                    let item = new_item(
                        list_id,
                        NewItem {
                            name: line.name,
                            quantity: line.quantity,
                            unit: line.unit,
                            category: None,
                            source: ItemSource::Recipe,
                            source_details: line.source_details,
                        },
                        display_order,
                    );
                    insert_item(&mut *tx, &item).await?;
                    display_order += 1;
                    open_items.push(item);
                    added += 1;
                }
            }
        }

        let mut plan_ids = list.meal_plan_ids;
        if !plan_ids.contains(&preview.meal_plan_id) {
            plan_ids.push(preview.meal_plan_id.clone());
        }
        sqlx::query("UPDATE shopping_lists SET meal_plan_ids = ?, updated_at = ? WHERE id = ?")
            .bind(to_json(&plan_ids)?)
            .bind(&now)
            .bind(list_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            list_id = %list_id,
            meal_plan_id = %preview.meal_plan_id,
            added,
            merged,
            excluded = excluded.len(),
            "Imported meal plan"
        );
        Ok(MealPlanImportResult {
            added,
            merged,
            excluded,
        })
    }

    // ==================== EXCLUDED ITEMS ====================

    pub async fn list_excluded_items(
        &self,
        user_id: &str,
        list_id: &str,
    ) -> Result<Vec<ExcludedItem>, AppError> {
        self.get_shopping_list(user_id, list_id).await?;
        let rows = sqlx::query(&format!(
            "SELECT {} FROM excluded_items WHERE list_id = ? ORDER BY created_at, name",
            EXCLUDED_COLUMNS
        ))
        .bind(list_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(excluded_from_row).collect())
    }

    /// Put an excluded line back on the list with the quantity the recipes need.
    pub async fn add_back_excluded(
        &self,
        user_id: &str,
        list_id: &str,
        excluded_id: &str,
    ) -> Result<ShoppingListItem, AppError> {
        self.get_mutable_list(user_id, list_id).await?;

        let mut tx = self.pool.begin().await?;
        touch_list(&mut *tx, list_id).await?;
        let row = sqlx::query(&format!(
            "SELECT {} FROM excluded_items WHERE id = ? AND list_id = ?",
            EXCLUDED_COLUMNS
        ))
        .bind(excluded_id)
        .bind(list_id)
        .fetch_optional(&mut *tx)
        .await?;
        let excluded = row
            .as_ref()
            .map(excluded_from_row)
            .ok_or_else(|| AppError::not_found("Excluded item", excluded_id))?;
        if excluded.added_back_at.is_some() {
            return Err(AppError::Conflict(format!(
                "{} was already added back",
                excluded.name
            )));
        }

        let display_order = next_display_order(&mut *tx, list_id).await?;
        let item = new_item(
            list_id,
            NewItem {
                name: excluded.name,
                quantity: excluded.required_quantity,
                unit: excluded.required_unit,
                category: None,
                source: ItemSource::Recipe,
                source_details: excluded.source_details,
            },
            display_order,
        );
        insert_item(&mut *tx, &item).await?;

        sqlx::query("UPDATE excluded_items SET added_back_at = ? WHERE id = ?")
            .bind(now())
            .bind(excluded_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(item)
    }
}

/// Whether any item of the list was imported from this staple.
fn references_staple(items: &[ShoppingListItem], staple_id: &str) -> bool {
    items.iter().any(|item| {
        item.source_details
            .iter()
            .any(|d| d.kind == ItemSource::Staple && d.ref_id.as_deref() == Some(staple_id))
    })
}

fn excluded_from_row(row: &SqliteRow) -> ExcludedItem {
    let details: String = row.get("source_details");
    ExcludedItem {
        id: row.get("id"),
        list_id: row.get("list_id"),
        name: row.get("name"),
        required_quantity: row.get("required_quantity"),
        required_unit: row.get("required_unit"),
        inventory_quantity: row.get("inventory_quantity"),
        inventory_unit: row.get("inventory_unit"),
        source_details: parse_source_details(&details),
        added_back_at: row.get("added_back_at"),
        created_at: row.get("created_at"),
    }
}
