//! Product catalog model.

use serde::{Deserialize, Serialize};

use super::{optional_length, require_length, require_positive};
use crate::errors::AppError;

/// A remembered grocery product with its usual quantity and unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub default_quantity: f64,
    pub default_unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating a product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_quantity")]
    pub default_quantity: f64,
    #[serde(default)]
    pub default_unit: String,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_quantity() -> f64 {
    1.0
}

impl CreateProductRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_length("Product name", &self.name, 1, 100)?;
        require_positive("Default quantity", self.default_quantity)?;
        optional_length("Unit", &Some(self.default_unit.clone()), 20)?;
        optional_length("Notes", &self.notes, 500)
    }
}

/// Request body for updating a product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub default_quantity: Option<f64>,
    #[serde(default)]
    pub default_unit: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl UpdateProductRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            require_length("Product name", name, 1, 100)?;
        }
        if let Some(quantity) = self.default_quantity {
            require_positive("Default quantity", quantity)?;
        }
        optional_length("Unit", &self.default_unit, 20)?;
        optional_length("Notes", &self.notes, 500)
    }
}

/// Query parameters for the product list.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductQuery {
    #[serde(default)]
    pub q: Option<String>,
}
