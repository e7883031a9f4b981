//! Persistence Bridge
//!
//! Whole-collection save/load against a named slot in a blob store.
//! Loading never fails: an absent or unreadable slot yields an empty list.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::error::Result;
use crate::item::ShoppingItem;
use crate::store::MutationHook;

pub const DEFAULT_SLOT: &str = "smartshop_items_v1";
const DATA_DIR: &str = "data";

/// Opaque key -> string storage.
pub trait BlobStore: Send + Sync {
    fn read(&self, slot: &str) -> Result<Option<String>>;
    fn write(&self, slot: &str, value: &str) -> Result<()>;
}

/// One `<slot>.json` file per slot under `<base_dir>/data/`.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(base_dir: &Path) -> Self {
        Self {
            dir: base_dir.join(DATA_DIR),
        }
    }

    pub fn path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{}.json", slot))
    }
}

impl BlobStore for FileBlobStore {
    fn read(&self, slot: &str) -> Result<Option<String>> {
        let path = self.path(slot);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path)?))
    }

    fn write(&self, slot: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(slot);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// In-memory blob store. Clones share the same slots.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a slot directly, bypassing serialization.
    pub fn insert(&self, slot: &str, value: &str) {
        if let Ok(mut slots) = self.slots.lock() {
            slots.insert(slot.to_string(), value.to_string());
        }
    }
}

impl BlobStore for MemoryBlobStore {
    fn read(&self, slot: &str) -> Result<Option<String>> {
        Ok(self
            .slots
            .lock()
            .ok()
            .and_then(|slots| slots.get(slot).cloned()))
    }

    fn write(&self, slot: &str, value: &str) -> Result<()> {
        self.insert(slot, value);
        Ok(())
    }
}

pub struct ListPersistence {
    store: Box<dyn BlobStore>,
    slot: String,
}

impl std::fmt::Debug for ListPersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListPersistence")
            .field("slot", &self.slot)
            .finish()
    }
}

impl ListPersistence {
    pub fn new(store: impl BlobStore + 'static, slot: impl Into<String>) -> Self {
        Self {
            store: Box::new(store),
            slot: slot.into(),
        }
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// Overwrite the slot with the full collection.
    pub fn save(&self, items: &[ShoppingItem]) -> Result<()> {
        let content = serde_json::to_string(items)?;
        self.store.write(&self.slot, &content)?;
        debug!(slot = %self.slot, count = items.len(), "saved list");
        Ok(())
    }

    /// Fire-and-forget save: failures are logged, never returned.
    pub fn save_logged(&self, items: &[ShoppingItem]) {
        if let Err(e) = self.save(items) {
            warn!(slot = %self.slot, error = %e, "failed to save list");
        }
    }

    /// Previously saved collection, or empty when absent or corrupt.
    pub fn load(&self) -> Vec<ShoppingItem> {
        let content = match self.store.read(&self.slot) {
            Ok(Some(content)) => content,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(slot = %self.slot, error = %e, "failed to read stored list, starting empty");
                return Vec::new();
            }
        };

        let items: Vec<ShoppingItem> = match serde_json::from_str(&content) {
            Ok(items) => items,
            Err(e) => {
                warn!(slot = %self.slot, error = %e, "stored list is corrupt, starting empty");
                return Vec::new();
            }
        };

        dedupe_ids(items)
    }
}

impl MutationHook for ListPersistence {
    fn on_mutation(&mut self, items: &[ShoppingItem]) {
        self.save_logged(items);
    }
}

/// Keep the first record for each id.
fn dedupe_ids(items: Vec<ShoppingItem>) -> Vec<ShoppingItem> {
    let mut seen = HashSet::with_capacity(items.len());
    let before = items.len();
    let items: Vec<ShoppingItem> = items.into_iter().filter(|i| seen.insert(i.id)).collect();
    if items.len() != before {
        warn!(dropped = before - items.len(), "dropped items with duplicate ids");
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ParsedItem;
    use crate::store::ItemStore;
    use tempfile::TempDir;

    fn sample_items() -> Vec<ShoppingItem> {
        let mut store = ItemStore::new();
        store.add_items(vec![
            ParsedItem::new("Milk", "Dairy"),
            ParsedItem::new("Apples", "Produce"),
            ParsedItem::new("Soap", ""),
        ]);
        let id = store.items()[1].id;
        store.toggle(&id);
        store.items().to_vec()
    }

    #[test]
    fn test_roundtrip_memory() {
        let persistence = ListPersistence::new(MemoryBlobStore::new(), DEFAULT_SLOT);
        let items = sample_items();
        persistence.save(&items).unwrap();
        assert_eq!(persistence.load(), items);
    }

    #[test]
    fn test_roundtrip_file() {
        let temp = TempDir::new().unwrap();
        let persistence = ListPersistence::new(FileBlobStore::new(temp.path()), DEFAULT_SLOT);
        let items = sample_items();
        persistence.save(&items).unwrap();

        let reopened = ListPersistence::new(FileBlobStore::new(temp.path()), DEFAULT_SLOT);
        assert_eq!(reopened.load(), items);
        assert!(temp
            .path()
            .join("data")
            .join(format!("{}.json", DEFAULT_SLOT))
            .exists());
    }

    #[test]
    fn test_save_overwrites() {
        let persistence = ListPersistence::new(MemoryBlobStore::new(), DEFAULT_SLOT);
        persistence.save(&sample_items()).unwrap();
        persistence.save(&[]).unwrap();
        assert!(persistence.load().is_empty());
    }

    #[test]
    fn test_missing_slot_loads_empty() {
        let temp = TempDir::new().unwrap();
        let persistence = ListPersistence::new(FileBlobStore::new(temp.path()), "nothing");
        assert!(persistence.load().is_empty());
    }

    #[test]
    fn test_corrupt_slot_loads_empty() {
        let blobs = MemoryBlobStore::new();
        blobs.insert(DEFAULT_SLOT, "{not json");
        let persistence = ListPersistence::new(blobs.clone(), DEFAULT_SLOT);
        assert!(persistence.load().is_empty());

        blobs.insert(DEFAULT_SLOT, r#"[{"id": "not-a-uuid", "name": "x", "isBought": false, "category": "y"}]"#);
        assert!(persistence.load().is_empty());
    }

    #[test]
    fn test_reads_original_blob_shape() {
        let blobs = MemoryBlobStore::new();
        blobs.insert(
            DEFAULT_SLOT,
            r#"[
                {"id": "6f1c2a8e-3b0d-4c5e-9f7a-1b2c3d4e5f60", "name": "Milk", "isBought": true, "category": "Dairy"},
                {"id": "0a1b2c3d-4e5f-4a6b-8c7d-9e0f1a2b3c4d", "name": "Bread", "isBought": false, "category": "Bakery"}
            ]"#,
        );
        let items = ListPersistence::new(blobs, DEFAULT_SLOT).load();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_bought);
        assert_eq!(items[1].category, "Bakery");
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let blobs = MemoryBlobStore::new();
        blobs.insert(
            DEFAULT_SLOT,
            r#"[
                {"id": "6f1c2a8e-3b0d-4c5e-9f7a-1b2c3d4e5f60", "name": "Milk", "isBought": false, "category": "Dairy"},
                {"id": "6f1c2a8e-3b0d-4c5e-9f7a-1b2c3d4e5f60", "name": "Copy", "isBought": true, "category": "Dairy"}
            ]"#,
        );
        let items = ListPersistence::new(blobs, DEFAULT_SLOT).load();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Milk");
    }

    #[test]
    fn test_hook_writes_on_mutation() {
        let blobs = MemoryBlobStore::new();
        let mut store =
            ItemStore::new().with_hook(ListPersistence::new(blobs.clone(), DEFAULT_SLOT));
        store.add_simple("Milk, Eggs");

        let reader = ListPersistence::new(blobs, DEFAULT_SLOT);
        assert_eq!(reader.load(), store.items());
    }

    #[test]
    fn test_hook_swallows_write_failure() {
        struct Broken;
        impl BlobStore for Broken {
            fn read(&self, _slot: &str) -> Result<Option<String>> {
                Ok(None)
            }
            fn write(&self, _slot: &str, _value: &str) -> Result<()> {
                Err(std::io::Error::other("disk full").into())
            }
        }

        let mut store = ItemStore::new().with_hook(ListPersistence::new(Broken, DEFAULT_SLOT));
        let ids = store.add_simple("Milk");
        assert_eq!(store.len(), 1);
        assert!(store.toggle(&ids[0]));
    }
}
