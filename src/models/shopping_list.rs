//! Shopping list, list item and exclusion models.

use serde::{Deserialize, Serialize};

use super::{optional_length, require_length, require_non_negative, StapleWithDue};
use crate::errors::AppError;

/// Lifecycle of a shopping list. Transitions only move forward.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ListStatus {
    Draft,
    Finalized,
    Archived,
}

impl ListStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListStatus::Draft => "draft",
            ListStatus::Finalized => "finalized",
            ListStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(ListStatus::Draft),
            "finalized" => Some(ListStatus::Finalized),
            "archived" => Some(ListStatus::Archived),
            _ => None,
        }
    }

    /// Whether a list in this status may move to `next`.
    pub fn can_transition_to(&self, next: ListStatus) -> bool {
        next > *self
    }
}

/// How a list item came to exist.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ItemSource {
    Manual,
    Recipe,
    Staple,
}

impl ItemSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemSource::Manual => "manual",
            ItemSource::Recipe => "recipe",
            ItemSource::Staple => "staple",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(ItemSource::Manual),
            "recipe" => Some(ItemSource::Recipe),
            "staple" => Some(ItemSource::Staple),
            _ => None,
        }
    }
}

/// Which recipe, staple or manual entry contributed to a list line, and how much.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SourceDetail {
    pub kind: ItemSource,
    /// Recipe id or staple id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal_plan_id: Option<String>,
    pub quantity: f64,
    pub unit: String,
}

/// A shopping list header with item counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingList {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: ListStatus,
    pub meal_plan_ids: Vec<String>,
    pub item_count: i64,
    pub purchased_count: i64,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<String>,
}

/// A shopping list together with its items in display order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListDetail {
    #[serde(flatten)]
    pub list: ShoppingList,
    pub items: Vec<ShoppingListItem>,
}

/// One line of a shopping list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListItem {
    pub id: String,
    pub list_id: String,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub source: ItemSource,
    pub source_details: Vec<SourceDetail>,
    pub is_purchased: bool,
    pub is_consolidated: bool,
    pub display_order: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating a shopping list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShoppingListRequest {
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateShoppingListRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_length("List name", &self.name, 1, 100)?;
        optional_length("Notes", &self.notes, 1000)
    }
}

/// Request body for updating a list header or moving its status forward.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShoppingListRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Option<ListStatus>,
}

impl UpdateShoppingListRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            require_length("List name", name, 1, 100)?;
        }
        optional_length("Notes", &self.notes, 1000)
    }
}

/// Request body for adding an item by hand.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub category: Option<String>,
}

fn default_quantity() -> f64 {
    1.0
}

impl CreateItemRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_length("Item name", &self.name, 1, 100)?;
        require_non_negative("Quantity", self.quantity)?;
        optional_length("Unit", &Some(self.unit.clone()), 20)?;
        optional_length("Category", &self.category, 50)
    }
}

/// Request body for editing an item or toggling its purchased flag.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_purchased: Option<bool>,
    #[serde(default)]
    pub display_order: Option<i64>,
}

impl UpdateItemRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            require_length("Item name", name, 1, 100)?;
        }
        if let Some(quantity) = self.quantity {
            require_non_negative("Quantity", quantity)?;
        }
        optional_length("Unit", &self.unit, 20)?;
        optional_length("Category", &self.category, 50)
    }
}

/// Request body for marking many items purchased or unpurchased at once.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkPurchaseRequest {
    pub item_ids: Vec<String>,
    pub purchased: bool,
}

/// Outcome for one item of a bulk operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkItemResult {
    pub item_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ==================== DEDUPLICATION ====================

/// Query parameters for duplicate detection.
#[derive(Debug, Clone, Deserialize)]
pub struct DedupQuery {
    #[serde(rename = "useAI", default)]
    pub use_ai: bool,
}

/// Request body merging a set of duplicate items into one.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeItemsRequest {
    pub item_ids: Vec<String>,
    #[serde(rename = "useAI", default)]
    pub use_ai: bool,
    /// Manual resolution for units that are not directly combinable
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl MergeItemsRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.item_ids.is_empty() {
            return Err(AppError::Validation("itemIds must not be empty".to_string()));
        }
        if let Some(quantity) = self.quantity {
            require_non_negative("Quantity", quantity)?;
        }
        if let Some(name) = &self.name {
            require_length("Item name", name, 1, 100)?;
        }
        optional_length("Unit", &self.unit, 20)
    }
}

/// The surviving item of a merge.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedItem {
    pub id: String,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

/// Result of a merge, shaped for rendering a before/after diff.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResult {
    pub previous_item_count: i64,
    pub new_item_count: i64,
    pub deleted_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_item: Option<MergedItem>,
}

/// A group that could not be merged during "combine all".
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupFailure {
    pub key: String,
    pub error: String,
}

/// Aggregate outcome of "combine all".
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombineAllResult {
    pub groups_merged: i64,
    pub total_deleted: i64,
    pub skipped_groups: i64,
    pub failures: Vec<GroupFailure>,
}

// ==================== IMPORTS ====================

/// A staple offered for import with its pre-selection state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StapleImportCandidate {
    #[serde(flatten)]
    pub staple: StapleWithDue,
    pub already_imported: bool,
    pub selected: bool,
}

/// Request body importing the chosen staples.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StapleImportRequest {
    pub staple_ids: Vec<String>,
}

/// Items created by a staple import.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StapleImportResult {
    pub added: Vec<ShoppingListItem>,
    /// Staple ids that were already on the list or not found
    pub skipped: Vec<String>,
}

/// Query parameters for the meal-plan import preview.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanImportQuery {
    pub meal_plan_id: String,
    #[serde(default = "default_true")]
    pub check_inventory: bool,
}

fn default_true() -> bool {
    true
}

/// Request body committing a meal-plan import.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanImportRequest {
    pub meal_plan_id: String,
    #[serde(default = "default_true")]
    pub check_inventory: bool,
    /// Restrict the import to these ingredient names; everything when absent
    #[serde(default)]
    pub names: Option<Vec<String>>,
}

/// Outcome of a meal-plan import.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanImportResult {
    pub added: i64,
    pub merged: i64,
    pub excluded: Vec<ExcludedItem>,
}

/// An ingredient left off a list because the inventory already covers it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExcludedItem {
    pub id: String,
    pub list_id: String,
    pub name: String,
    pub required_quantity: f64,
    pub required_unit: String,
    pub inventory_quantity: f64,
    pub inventory_unit: String,
    pub source_details: Vec<SourceDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_back_at: Option<String>,
    pub created_at: String,
}

/// Request body overriding an exclusion.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBackRequest {
    pub excluded_item_id: String,
}

// ==================== CONVERT TO INVENTORY ====================

/// What converting a purchased item will do.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConvertAction {
    Merge,
    Create,
}

/// Inventory row a purchased item would merge into.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryMatch {
    pub id: String,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

/// Preview line for converting one purchased item.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertPreviewItem {
    pub item_id: String,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub action: ConvertAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing: Option<InventoryMatch>,
}

/// Request body committing a conversion.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertToInventoryRequest {
    /// Purchased items to convert; all purchased items when absent
    #[serde(default)]
    pub item_ids: Option<Vec<String>>,
    #[serde(default = "default_true")]
    pub merge_with_existing: bool,
    #[serde(default)]
    pub archive_list: bool,
}

/// Outcome of a conversion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResult {
    pub created: i64,
    pub merged: i64,
    pub staple_updates: i64,
    pub archived: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_moves_forward_only() {
        assert!(ListStatus::Draft.can_transition_to(ListStatus::Finalized));
        assert!(ListStatus::Draft.can_transition_to(ListStatus::Archived));
        assert!(ListStatus::Finalized.can_transition_to(ListStatus::Archived));
        assert!(!ListStatus::Finalized.can_transition_to(ListStatus::Draft));
        assert!(!ListStatus::Archived.can_transition_to(ListStatus::Finalized));
        assert!(!ListStatus::Draft.can_transition_to(ListStatus::Draft));
    }

    #[test]
    fn test_merge_request_uses_ai_casing() {
        let req: MergeItemsRequest =
            serde_json::from_str(r#"{"itemIds":["a","b"],"useAI":true}"#).unwrap();
        assert!(req.use_ai);
        assert_eq!(req.item_ids.len(), 2);
        assert!(req.validate().is_ok());
    }
}
