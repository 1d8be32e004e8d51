//! Categories and the product catalog.

use sqlx::{sqlite::SqliteRow, Row};

use super::repository::{ensure_owner, new_id, non_blank, now, Repository};
use crate::errors::AppError;
use crate::models::{
    Category, CreateCategoryRequest, CreateProductRequest, Product, UpdateCategoryRequest,
    UpdateProductRequest,
};

const CATEGORY_COLUMNS: &str = "id, user_id, name, display_order, is_default, created_at";
const PRODUCT_COLUMNS: &str =
    "id, user_id, name, category, default_quantity, default_unit, notes, created_at, updated_at";

impl Repository {
    // ==================== CATEGORY OPERATIONS ====================

    pub async fn list_categories(&self, user_id: &str) -> Result<Vec<Category>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM categories WHERE user_id = ? ORDER BY display_order, name",
            CATEGORY_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(category_from_row).collect())
    }

    pub async fn category_names(&self, user_id: &str) -> Result<Vec<String>, AppError> {
        Ok(self
            .list_categories(user_id)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    pub async fn get_category(&self, user_id: &str, id: &str) -> Result<Category, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM categories WHERE id = ?",
            CATEGORY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let category = row
            .as_ref()
            .map(category_from_row)
            .ok_or_else(|| AppError::not_found("Category", id))?;
        ensure_owner(&category.user_id, user_id, "category")?;
        Ok(category)
    }

    async fn ensure_category_name_free(
        &self,
        user_id: &str,
        name: &str,
        except_id: Option<&str>,
    ) -> Result<(), AppError> {
        let row = sqlx::query(
            "SELECT id FROM categories WHERE user_id = ? AND name = ? COLLATE NOCASE AND id != ?",
        )
        .bind(user_id)
        .bind(name)
        .bind(except_id.unwrap_or(""))
        .fetch_optional(&self.pool)
        .await?;
        if row.is_some() {
            return Err(AppError::Conflict(format!(
                "Category \"{}\" already exists",
                name
            )));
        }
        Ok(())
    }

    pub async fn create_category(
        &self,
        user_id: &str,
        request: &CreateCategoryRequest,
    ) -> Result<Category, AppError> {
        let name = request.name.trim();
        self.ensure_category_name_free(user_id, name, None).await?;

        let next_order: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(display_order) + 1, 0) FROM categories WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let category = Category {
            id: new_id(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            display_order: next_order,
            is_default: false,
            created_at: now(),
        };

        sqlx::query(
            "INSERT INTO categories (id, user_id, name, display_order, is_default, created_at) VALUES (?, ?, ?, ?, 0, ?)",
        )
        .bind(&category.id)
        .bind(user_id)
        .bind(&category.name)
        .bind(category.display_order)
        .bind(&category.created_at)
        .execute(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn update_category(
        &self,
        user_id: &str,
        id: &str,
        request: &UpdateCategoryRequest,
    ) -> Result<Category, AppError> {
        let mut category = self.get_category(user_id, id).await?;

        if let Some(name) = &request.name {
            let name = name.trim();
            self.ensure_category_name_free(user_id, name, Some(id)).await?;
            category.name = name.to_string();
        }
        if let Some(order) = request.display_order {
            category.display_order = order;
        }

        sqlx::query("UPDATE categories SET name = ?, display_order = ? WHERE id = ? AND user_id = ?")
            .bind(&category.name)
            .bind(category.display_order)
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(category)
    }

    pub async fn delete_category(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        self.get_category(user_id, id).await?;
        sqlx::query("DELETE FROM categories WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Assign display order by position. Every id must belong to the user.
    pub async fn reorder_categories(
        &self,
        user_id: &str,
        ids: &[String],
    ) -> Result<Vec<Category>, AppError> {
        let mut tx = self.pool.begin().await?;

        for (position, id) in ids.iter().enumerate() {
            let owner: Option<String> =
                sqlx::query_scalar("SELECT user_id FROM categories WHERE id = ?")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?;
            let owner = owner.ok_or_else(|| AppError::not_found("Category", id))?;
            ensure_owner(&owner, user_id, "category")?;

            sqlx::query("UPDATE categories SET display_order = ? WHERE id = ?")
                .bind(position as i64)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        self.list_categories(user_id).await
    }

    // ==================== PRODUCT OPERATIONS ====================

    /// List products, optionally filtered by a name fragment.
    pub async fn list_products(
        &self,
        user_id: &str,
        query: Option<&str>,
    ) -> Result<Vec<Product>, AppError> {
        let pattern = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", q.replace('%', "").replace('_', "")));

        let rows = match pattern {
            Some(pattern) => {
                sqlx::query(&format!(
                    "SELECT {} FROM products WHERE user_id = ? AND name LIKE ? ORDER BY name",
                    PRODUCT_COLUMNS
                ))
                .bind(user_id)
                .bind(pattern)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {} FROM products WHERE user_id = ? ORDER BY name",
                    PRODUCT_COLUMNS
                ))
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows.iter().map(product_from_row).collect())
    }

    pub async fn get_product(&self, user_id: &str, id: &str) -> Result<Product, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM products WHERE id = ?", PRODUCT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let product = row
            .as_ref()
            .map(product_from_row)
            .ok_or_else(|| AppError::not_found("Product", id))?;
        ensure_owner(&product.user_id, user_id, "product")?;
        Ok(product)
    }

    pub async fn create_product(
        &self,
        user_id: &str,
        request: &CreateProductRequest,
    ) -> Result<Product, AppError> {
        let now = now();
        let product = Product {
            id: new_id(),
            user_id: user_id.to_string(),
            name: request.name.trim().to_string(),
            category: non_blank(&request.category),
            default_quantity: request.default_quantity,
            default_unit: request.default_unit.trim().to_string(),
            notes: non_blank(&request.notes),
            created_at: now.clone(),
            updated_at: now,
        };

        sqlx::query(&format!(
            "INSERT INTO products ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            PRODUCT_COLUMNS
        ))
        .bind(&product.id)
        .bind(&product.user_id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.default_quantity)
        .bind(&product.default_unit)
        .bind(&product.notes)
        .bind(&product.created_at)
        .bind(&product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    pub async fn update_product(
        &self,
        user_id: &str,
        id: &str,
        request: &UpdateProductRequest,
    ) -> Result<Product, AppError> {
        let existing = self.get_product(user_id, id).await?;
        let product = Product {
            name: request
                .name
                .as_deref()
                .map(|n| n.trim().to_string())
                .unwrap_or(existing.name),
            category: if request.category.is_some() {
                non_blank(&request.category)
            } else {
                existing.category
            },
            default_quantity: request.default_quantity.unwrap_or(existing.default_quantity),
            default_unit: request
                .default_unit
                .as_deref()
                .map(|u| u.trim().to_string())
                .unwrap_or(existing.default_unit),
            notes: if request.notes.is_some() {
                non_blank(&request.notes)
            } else {
                existing.notes
            },
            updated_at: now(),
            ..existing
        };

        sqlx::query(
            "UPDATE products SET name = ?, category = ?, default_quantity = ?, default_unit = ?, notes = ?, updated_at = ? WHERE id = ? AND user_id = ?",
        )
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.default_quantity)
        .bind(&product.default_unit)
        .bind(&product.notes)
        .bind(&product.updated_at)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    pub async fn delete_product(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        self.get_product(user_id, id).await?;
        sqlx::query("DELETE FROM products WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn category_from_row(row: &SqliteRow) -> Category {
    let is_default: i64 = row.get("is_default");
    Category {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        display_order: row.get("display_order"),
        is_default: is_default != 0,
        created_at: row.get("created_at"),
    }
}

fn product_from_row(row: &SqliteRow) -> Product {
    Product {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        category: row.get("category"),
        default_quantity: row.get("default_quantity"),
        default_unit: row.get("default_unit"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
