//! Grocery category model.

use serde::{Deserialize, Serialize};

use super::require_length;
use crate::errors::AppError;

/// A user-owned grocery category used to group list and inventory items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub display_order: i64,
    pub is_default: bool,
    pub created_at: String,
}

/// Request body for creating a category.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub name: String,
}

impl CreateCategoryRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_length("Category name", &self.name, 1, 50)
    }
}

/// Request body for renaming or moving a category.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_order: Option<i64>,
}

impl UpdateCategoryRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            require_length("Category name", name, 1, 50)?;
        }
        if matches!(self.display_order, Some(order) if order < 0) {
            return Err(AppError::Validation(
                "Display order must be zero or greater".to_string(),
            ));
        }
        Ok(())
    }
}

/// Request body assigning display order by position in `ids`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderCategoriesRequest {
    pub ids: Vec<String>,
}
