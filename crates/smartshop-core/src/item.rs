use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category assigned when no classifier is configured, and by simple add.
pub const GENERAL_CATEGORY: &str = "General";

/// Category assigned when the classifier call failed, and to items stored
/// without a category.
pub const UNCATEGORIZED_CATEGORY: &str = "Uncategorized";

/// Opaque item identifier (random UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First 8 hex digits, used for display.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }

    /// Matches a full id or a prefix of it, with or without hyphens.
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        let prefix = prefix.trim().to_ascii_lowercase();
        if prefix.is_empty() {
            return false;
        }
        self.0.hyphenated().to_string().starts_with(&prefix)
            || self.0.simple().to_string().starts_with(&prefix)
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for ItemId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// A single shopping-list entry.
///
/// Only `is_bought` changes after creation; the store hands out shared
/// references so the other fields stay fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingItem {
    pub id: ItemId,
    pub name: String,
    pub is_bought: bool,
    pub category: String,
}

impl ShoppingItem {
    pub(crate) fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            is_bought: false,
            category: category.into(),
        }
    }

    /// Category used for grouping: the stored label, or the
    /// uncategorized sentinel when it is blank.
    pub fn display_category(&self) -> &str {
        if self.category.trim().is_empty() {
            UNCATEGORIZED_CATEGORY
        } else {
            &self.category
        }
    }
}

/// A `(name, category)` pair produced by a classifier or by manual entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedItem {
    pub name: String,
    pub category: String,
}

impl ParsedItem {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_serializes_with_camel_case_flag() {
        let item = ShoppingItem::new("Milk", "Dairy");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["name"], "Milk");
        assert_eq!(json["category"], "Dairy");
        assert_eq!(json["isBought"], false);
        assert!(json["id"].is_string());
        assert_eq!(json.as_object().unwrap().len(), 4);
    }

    #[test]
    fn test_item_id_roundtrip_through_string() {
        let id = ItemId::new();
        let parsed: ItemId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_item_id_prefix_match() {
        let id = ItemId::new();
        assert!(id.matches_prefix(&id.short()));
        assert!(id.matches_prefix(&id.to_string()));
        assert!(id.matches_prefix(&id.short().to_uppercase()));
        assert!(!id.matches_prefix(""));
    }

    #[test]
    fn test_display_category_defaults_when_blank() {
        let mut item = ShoppingItem::new("Soap", "  ");
        assert_eq!(item.display_category(), UNCATEGORIZED_CATEGORY);
        item.category = "Household".to_string();
        assert_eq!(item.display_category(), "Household");
    }

    #[test]
    fn test_new_items_have_distinct_ids() {
        let a = ShoppingItem::new("a", GENERAL_CATEGORY);
        let b = ShoppingItem::new("b", GENERAL_CATEGORY);
        assert_ne!(a.id, b.id);
        assert!(!a.is_bought);
    }
}
