//! Household inventory models.

use serde::{Deserialize, Serialize};

use super::{optional_length, parse_date, require_length, require_non_negative};
use crate::errors::AppError;

/// Where an inventory item is stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageLocation {
    #[default]
    Pantry,
    Fridge,
    Freezer,
    Other,
}

impl StorageLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageLocation::Pantry => "pantry",
            StorageLocation::Fridge => "fridge",
            StorageLocation::Freezer => "freezer",
            StorageLocation::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pantry" => Some(StorageLocation::Pantry),
            "fridge" => Some(StorageLocation::Fridge),
            "freezer" => Some(StorageLocation::Freezer),
            "other" => Some(StorageLocation::Other),
            _ => None,
        }
    }
}

/// Something the household currently has at home.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub location: StorageLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for adding an inventory item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInventoryItemRequest {
    pub name: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: StorageLocation,
    #[serde(default)]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateInventoryItemRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_length("Item name", &self.name, 1, 100)?;
        require_non_negative("Quantity", self.quantity)?;
        optional_length("Unit", &Some(self.unit.clone()), 20)?;
        if let Some(date) = &self.expiry_date {
            parse_date("Expiry date", date)?;
        }
        optional_length("Notes", &self.notes, 500)
    }
}

/// Request body for updating an inventory item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInventoryItemRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: Option<StorageLocation>,
    #[serde(default)]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl UpdateInventoryItemRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            require_length("Item name", name, 1, 100)?;
        }
        if let Some(quantity) = self.quantity {
            require_non_negative("Quantity", quantity)?;
        }
        optional_length("Unit", &self.unit, 20)?;
        if let Some(date) = &self.expiry_date {
            parse_date("Expiry date", date)?;
        }
        optional_length("Notes", &self.notes, 500)
    }
}

/// Query parameters for the expiring-items view.
#[derive(Debug, Deserialize)]
pub struct ExpiringQuery {
    #[serde(default = "default_expiring_days")]
    pub days: i64,
}

fn default_expiring_days() -> i64 {
    3
}
