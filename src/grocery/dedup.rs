//! Duplicate detection for shopping-list items.
//!
//! Unpurchased items whose names normalize to the same key form a group.
//! Each group reports whether its units sum directly and how confident that
//! sum is; groups that need judgement are flagged instead of summed.

use std::collections::HashMap;

use serde::Serialize;

use super::normalize::normalize_name;
use super::units::{sum_quantities, Combined};
use crate::models::{ShoppingListItem, SourceDetail};

/// How sure the system is that a group's combined value is right.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// A summed quantity in one unit.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CombinedQuantity {
    pub quantity: f64,
    pub unit: String,
}

impl From<Combined> for CombinedQuantity {
    fn from(c: Combined) -> Self {
        Self {
            quantity: c.quantity,
            unit: c.unit,
        }
    }
}

/// Suggested resolution for a group whose units need judgement.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AiSuggestion {
    pub quantity: f64,
    pub unit: String,
    pub reasoning: String,
}

/// Member of a duplicate group.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub id: String,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

/// Items that look like the same grocery under different names or units.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroup {
    pub key: String,
    /// Name the merged item will carry
    pub suggested_name: String,
    pub items: Vec<GroupMember>,
    pub confidence: Confidence,
    pub combined_result: Option<CombinedQuantity>,
    pub requires_resolution: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_suggestion: Option<AiSuggestion>,
}

impl DuplicateGroup {
    pub fn item_ids(&self) -> Vec<String> {
        self.items.iter().map(|m| m.id.clone()).collect()
    }
}

/// Group the unpurchased items of a list into duplicate candidates.
///
/// Groups are ordered by the display order of their first member and members
/// keep list order, so the first member is the merge survivor.
pub fn find_duplicate_groups(items: &[ShoppingListItem]) -> Vec<DuplicateGroup> {
    let mut ordered: Vec<&ShoppingListItem> = items.iter().filter(|i| !i.is_purchased).collect();
    ordered.sort_by_key(|i| i.display_order);

    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, Vec<(&ShoppingListItem, bool)>> = HashMap::new();
    for item in ordered {
        let name = normalize_name(&item.name);
        let via_synonym = name.via_synonym();
        let bucket = buckets.entry(name.key.clone()).or_insert_with(|| {
            order.push(name.key.clone());
            Vec::new()
        });
        bucket.push((item, via_synonym));
    }

    order
        .into_iter()
        .filter_map(|key| {
            let members = buckets.remove(&key)?;
            if members.len() < 2 {
                return None;
            }
            Some(build_group(key, &members))
        })
        .collect()
}

fn build_group(key: String, members: &[(&ShoppingListItem, bool)]) -> DuplicateGroup {
    let items: Vec<&ShoppingListItem> = members.iter().map(|(item, _)| *item).collect();
    // Members only share a key through a synonym when their bases differ.
    let bases: Vec<String> = items.iter().map(|i| normalize_name(&i.name).base).collect();
    let synonym_folded =
        members.iter().any(|(_, via)| *via) && bases.iter().any(|b| *b != bases[0]);

    let combined = combine_items(&items);
    let (confidence, requires_resolution) = match &combined {
        None => (Confidence::Low, true),
        Some(c) => (confidence_for(c.converted, synonym_folded), false),
    };

    DuplicateGroup {
        key,
        suggested_name: items[0].name.clone(),
        items: items
            .iter()
            .map(|i| GroupMember {
                id: i.id.clone(),
                name: i.name.clone(),
                quantity: i.quantity,
                unit: i.unit.clone(),
            })
            .collect(),
        confidence,
        combined_result: combined.map(CombinedQuantity::from),
        requires_resolution,
        ai_suggestion: None,
    }
}

fn confidence_for(converted: bool, synonym_folded: bool) -> Confidence {
    match (converted, synonym_folded) {
        (false, false) => Confidence::High,
        (true, true) => Confidence::Low,
        _ => Confidence::Medium,
    }
}

/// Sum the quantities of items when their units allow it.
pub fn combine_items(items: &[&ShoppingListItem]) -> Option<Combined> {
    sum_quantities(items.iter().map(|i| (i.quantity, i.unit.as_str())))
}

/// Source details of all items, without repeating identical records.
pub fn merged_source_details(items: &[&ShoppingListItem]) -> Vec<SourceDetail> {
    let mut details: Vec<SourceDetail> = Vec::new();
    for detail in items.iter().flat_map(|i| i.source_details.iter()) {
        if !details.contains(detail) {
            details.push(detail.clone());
        }
    }
    details
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemSource;

    fn item(id: &str, name: &str, quantity: f64, unit: &str, order: i64) -> ShoppingListItem {
        ShoppingListItem {
            id: id.to_string(),
            list_id: "list".to_string(),
            name: name.to_string(),
            quantity,
            unit: unit.to_string(),
            category: None,
            source: ItemSource::Manual,
            source_details: Vec::new(),
            is_purchased: false,
            is_consolidated: false,
            display_order: order,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_tomato_plural_is_high_confidence() {
        let items = vec![
            item("1", "Tomato", 2.0, "pcs", 0),
            item("2", "tomatoes", 3.0, "pcs", 1),
            item("3", "Milk", 1.0, "l", 2),
        ];
        let groups = find_duplicate_groups(&items);
        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.confidence, Confidence::High);
        assert!(!group.requires_resolution);
        assert_eq!(
            group.combined_result,
            Some(CombinedQuantity {
                quantity: 5.0,
                unit: "pcs".to_string()
            })
        );
        assert_eq!(group.item_ids(), vec!["1", "2"]);
        assert_eq!(group.suggested_name, "Tomato");
    }

    #[test]
    fn test_conversion_is_medium_confidence() {
        let items = vec![
            item("1", "Flour", 500.0, "g", 0),
            item("2", "flour", 1.0, "kg", 1),
        ];
        let groups = find_duplicate_groups(&items);
        assert_eq!(groups[0].confidence, Confidence::Medium);
        assert_eq!(
            groups[0].combined_result,
            Some(CombinedQuantity {
                quantity: 1.5,
                unit: "kg".to_string()
            })
        );
    }

    #[test]
    fn test_synonym_with_same_unit_is_medium() {
        let items = vec![
            item("1", "Scallions", 1.0, "bunch", 0),
            item("2", "Green onion", 1.0, "bunch", 1),
        ];
        let groups = find_duplicate_groups(&items);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].confidence, Confidence::Medium);
    }

    #[test]
    fn test_incompatible_units_require_resolution() {
        let items = vec![
            item("1", "Chickpeas", 2.0, "can", 0),
            item("2", "chickpea", 400.0, "g", 1),
        ];
        let groups = find_duplicate_groups(&items);
        assert_eq!(groups.len(), 1);
        assert!(groups[0].requires_resolution);
        assert!(groups[0].combined_result.is_none());
        assert_eq!(groups[0].confidence, Confidence::Low);
    }

    #[test]
    fn test_purchased_items_and_singletons_are_ignored() {
        let mut purchased = item("2", "Eggs", 6.0, "pcs", 1);
        purchased.is_purchased = true;
        let items = vec![item("1", "Egg", 6.0, "pcs", 0), purchased, item("3", "Rice", 1.0, "kg", 2)];
        assert!(find_duplicate_groups(&items).is_empty());
    }

    #[test]
    fn test_survivor_is_lowest_display_order() {
        let items = vec![
            item("late", "apples", 2.0, "pcs", 5),
            item("early", "Apple", 1.0, "pcs", 1),
        ];
        let groups = find_duplicate_groups(&items);
        assert_eq!(groups[0].items[0].id, "early");
    }
}
