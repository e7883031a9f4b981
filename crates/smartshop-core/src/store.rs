//! Item Store
//!
//! The ordered collection of shopping items and the only place it is
//! mutated. Each mutation that changes the collection is followed by a
//! synchronous call to the installed [`MutationHook`]; the hook never
//! affects the operation's return value.

use tracing::debug;

use crate::classify::split_simple;
use crate::error::{Result, ShopError};
use crate::item::{ItemId, ParsedItem, ShoppingItem, GENERAL_CATEGORY};

/// Observer invoked after every mutation with the full collection.
pub trait MutationHook {
    fn on_mutation(&mut self, items: &[ShoppingItem]);
}

impl<F> MutationHook for F
where
    F: FnMut(&[ShoppingItem]),
{
    fn on_mutation(&mut self, items: &[ShoppingItem]) {
        self(items)
    }
}

#[derive(Default)]
pub struct ItemStore {
    items: Vec<ShoppingItem>,
    hook: Option<Box<dyn MutationHook + Send>>,
}

impl std::fmt::Debug for ItemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemStore")
            .field("items", &self.items)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a previously loaded collection.
    pub fn from_items(items: Vec<ShoppingItem>) -> Self {
        Self { items, hook: None }
    }

    pub fn with_hook(mut self, hook: impl MutationHook + Send + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn set_hook(&mut self, hook: impl MutationHook + Send + 'static) {
        self.hook = Some(Box::new(hook));
    }

    pub fn items(&self) -> &[ShoppingItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &ItemId) -> Option<&ShoppingItem> {
        self.items.iter().find(|item| item.id == *id)
    }

    /// Find an item by full id or unique id prefix.
    pub fn resolve(&self, prefix: &str) -> Result<Option<ItemId>> {
        let matches: Vec<ItemId> = self
            .items
            .iter()
            .filter(|item| item.id.matches_prefix(prefix))
            .map(|item| item.id)
            .collect();

        match matches.len() {
            0 => Ok(None),
            1 => Ok(Some(matches[0])),
            count => Err(ShopError::AmbiguousId {
                prefix: prefix.to_string(),
                count,
            }),
        }
    }

    /// Append items with fresh ids. Names are trimmed; blank names are dropped.
    pub fn add_items<I>(&mut self, parsed: I) -> Vec<ItemId>
    where
        I: IntoIterator<Item = ParsedItem>,
    {
        let mut added = Vec::new();
        for ParsedItem { name, category } in parsed {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let item = ShoppingItem::new(name, category.trim());
            added.push(item.id);
            self.items.push(item);
        }

        if !added.is_empty() {
            debug!(count = added.len(), "added items");
            self.notify();
        }
        added
    }

    /// Comma-separated entry, every item filed under "General".
    pub fn add_simple(&mut self, text: &str) -> Vec<ItemId> {
        self.add_items(
            split_simple(text)
                .into_iter()
                .map(|name| ParsedItem::new(name, GENERAL_CATEGORY)),
        )
    }

    /// Flip the bought flag. Returns false when no item has this id.
    pub fn toggle(&mut self, id: &ItemId) -> bool {
        let Some(item) = self.items.iter_mut().find(|item| item.id == *id) else {
            debug!(%id, "toggle: no matching item");
            return false;
        };
        item.is_bought = !item.is_bought;
        debug!(%id, is_bought = item.is_bought, "toggled item");
        self.notify();
        true
    }

    /// Remove one item. Returns false when no item has this id.
    pub fn delete(&mut self, id: &ItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != *id);
        if self.items.len() == before {
            debug!(%id, "delete: no matching item");
            return false;
        }
        self.notify();
        true
    }

    /// Remove every bought item; returns how many were removed.
    pub fn clear_completed(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !item.is_bought);
        let removed = before - self.items.len();
        if removed > 0 {
            debug!(removed, "cleared completed items");
            self.notify();
        }
        removed
    }

    /// Remove every item; returns how many were removed.
    pub fn reset_all(&mut self) -> usize {
        let removed = self.items.len();
        self.items.clear();
        if removed > 0 {
            debug!(removed, "reset list");
            self.notify();
        }
        removed
    }

    fn notify(&mut self) {
        if let Some(hook) = self.hook.as_mut() {
            hook.on_mutation(&self.items);
        }
    }
}
