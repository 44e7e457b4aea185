//! Cache Module
//!
//! Provides a thread-safe cache with LRU eviction, TTL expiry and loader-driven refresh.

mod entry;
mod erased;
mod loader;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::Entry;
pub use erased::{downcast, erase, ErasedValue};
pub use loader::{LoadError, LoadResult, Loaded, Loader};
pub use lru::LruList;
pub use stats::CacheStats;
pub use store::Cache;
