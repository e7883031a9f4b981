//! Session
//!
//! One open/operate/close cycle over the persisted list. Opening loads the
//! stored collection and installs the persistence hook; every mutation
//! then saves through the hook; [`Session::close`] performs a final save.
//!
//! Smart add is split in two so that manual edits can run while the
//! classifier call is outstanding:
//!
//! ```rust,ignore
//! let pending = session.submit_smart("Lasagna");
//! session.add_simple("Coffee");            // allowed while pending
//! let classification = pending.resolve().await;
//! session.apply(&classification);          // appended after "Coffee"
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::classify::{Classification, TextClassifier};
use crate::config::Config;
use crate::error::Result;
use crate::item::{ItemId, ShoppingItem};
use crate::organize::{organize, OrganizedList, ViewFilter};
use crate::persist::{FileBlobStore, ListPersistence};
use crate::store::ItemStore;

#[derive(Debug)]
pub struct Session {
    store: ItemStore,
    persistence: Arc<ListPersistence>,
    classifier: Arc<TextClassifier>,
    processing: Arc<AtomicUsize>,
}

impl Session {
    /// Open the list stored under `base_dir` using `config`.
    pub fn open(config: &Config, base_dir: &Path) -> Result<Self> {
        let persistence = ListPersistence::new(FileBlobStore::new(base_dir), &config.storage.slot);
        let classifier = TextClassifier::from_config(&config.classifier)?;
        Ok(Self::with_parts(persistence, classifier))
    }

    pub fn with_parts(persistence: ListPersistence, classifier: TextClassifier) -> Self {
        let persistence = Arc::new(persistence);
        let items = persistence.load();
        debug!(slot = persistence.slot(), count = items.len(), "opened session");

        let hook = Arc::clone(&persistence);
        let store = ItemStore::from_items(items)
            .with_hook(move |items: &[ShoppingItem]| hook.save_logged(items));

        Self {
            store,
            persistence,
            classifier: Arc::new(classifier),
            processing: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub fn items(&self) -> &[ShoppingItem] {
        self.store.items()
    }

    pub fn classifier(&self) -> &TextClassifier {
        &self.classifier
    }

    /// True while any smart add is outstanding.
    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst) > 0
    }

    pub fn view(&self, filter: ViewFilter) -> OrganizedList {
        organize(self.store.items(), filter)
    }

    pub fn resolve(&self, prefix: &str) -> Result<Option<ItemId>> {
        self.store.resolve(prefix)
    }

    pub fn add_simple(&mut self, text: &str) -> Vec<ItemId> {
        self.store.add_simple(text)
    }

    pub fn toggle(&mut self, id: &ItemId) -> bool {
        self.store.toggle(id)
    }

    pub fn delete(&mut self, id: &ItemId) -> bool {
        self.store.delete(id)
    }

    pub fn clear_completed(&mut self) -> usize {
        self.store.clear_completed()
    }

    pub fn reset_all(&mut self) -> usize {
        self.store.reset_all()
    }

    /// Start a smart add. The session counts as processing until every
    /// returned request has resolved or been dropped.
    pub fn submit_smart(&self, text: &str) -> PendingClassification {
        self.processing.fetch_add(1, Ordering::SeqCst);
        PendingClassification {
            classifier: Arc::clone(&self.classifier),
            text: text.to_string(),
            _guard: ProcessingGuard(Arc::clone(&self.processing)),
        }
    }

    /// Append the items of a resolved classification.
    pub fn apply(&mut self, classification: &Classification) -> Vec<ItemId> {
        self.store.add_items(classification.items.iter().cloned())
    }

    /// Classify and append in one step.
    pub async fn add_smart(&mut self, text: &str) -> (Classification, Vec<ItemId>) {
        let classification = self.submit_smart(text).resolve().await;
        let added = self.apply(&classification);
        (classification, added)
    }

    /// Final save.
    pub fn close(self) -> Result<()> {
        self.persistence.save(self.store.items())?;
        debug!(slot = self.persistence.slot(), "closed session");
        Ok(())
    }
}

/// An outstanding smart-add request.
#[derive(Debug)]
pub struct PendingClassification {
    classifier: Arc<TextClassifier>,
    text: String,
    _guard: ProcessingGuard,
}

impl PendingClassification {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub async fn resolve(self) -> Classification {
        self.classifier.classify(&self.text).await
    }
}

#[derive(Debug)]
struct ProcessingGuard(Arc<AtomicUsize>);

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
