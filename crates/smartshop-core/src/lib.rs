pub mod classify;
pub mod config;
pub mod error;
pub mod item;
pub mod organize;
pub mod persist;
pub mod session;
pub mod store;

pub use classify::{
    Classification, ClassificationOutcome, ClassifierBackend, ClaudeCliBackend, GeminiBackend,
    TextClassifier,
};
pub use config::{ClassifierConfig, ClassifierProvider, Config, StorageConfig};
pub use error::{Result, ShopError};
pub use item::{ItemId, ParsedItem, ShoppingItem, GENERAL_CATEGORY, UNCATEGORIZED_CATEGORY};
pub use organize::{organize, GroupedProjection, ListStats, OrganizedList, ViewFilter};
pub use persist::{BlobStore, FileBlobStore, ListPersistence, MemoryBlobStore, DEFAULT_SLOT};
pub use session::{PendingClassification, Session};
pub use store::{ItemStore, MutationHook};
