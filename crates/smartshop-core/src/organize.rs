//! List Organizer
//!
//! Pure derivation of the display projection: filter, stable partition
//! into pending-then-bought, group by category in first-seen order.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::ShopError;
use crate::item::ShoppingItem;

/// Which items the projection includes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewFilter {
    #[default]
    All,
    /// Hide bought items
    Pending,
}

impl FromStr for ViewFilter {
    type Err = ShopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "pending" => Ok(Self::Pending),
            _ => Err(ShopError::InvalidView {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ViewFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Pending => write!(f, "pending"),
        }
    }
}

/// Category label -> items, iterated in first-seen order.
pub type GroupedProjection = IndexMap<String, Vec<ShoppingItem>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ListStats {
    pub total_count: usize,
    pub bought_count: usize,
    pub progress_percent: u8,
}

impl ListStats {
    pub fn from_items(items: &[ShoppingItem]) -> Self {
        let total_count = items.len();
        let bought_count = items.iter().filter(|item| item.is_bought).count();
        Self {
            total_count,
            bought_count,
            progress_percent: progress_percent(bought_count, total_count),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.total_count - self.bought_count
    }
}

/// `round(100 * bought / total)` with halves rounded up; 0 for an empty list.
pub fn progress_percent(bought: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let bought = bought.min(total) as u64;
    let total = total as u64;
    ((200 * bought + total) / (2 * total)) as u8
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrganizedList {
    pub filter: ViewFilter,
    pub groups: GroupedProjection,
    /// Computed over the whole collection regardless of the filter.
    pub stats: ListStats,
}

impl OrganizedList {
    /// Items in display order, flattened across groups.
    pub fn iter(&self) -> impl Iterator<Item = &ShoppingItem> {
        self.groups.values().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

pub fn organize(items: &[ShoppingItem], filter: ViewFilter) -> OrganizedList {
    let mut visible: Vec<&ShoppingItem> = items
        .iter()
        .filter(|item| filter == ViewFilter::All || !item.is_bought)
        .collect();

    // `sort_by_key` is stable, so original order holds within each partition.
    visible.sort_by_key(|item| item.is_bought);

    let mut groups = GroupedProjection::new();
    for item in visible {
        groups
            .entry(item.display_category().to_string())
            .or_default()
            .push(item.clone());
    }

    OrganizedList {
        filter,
        groups,
        stats: ListStats::from_items(items),
    }
}
