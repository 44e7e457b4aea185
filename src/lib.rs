//! lruttl - A thread-safe LRU cache with TTL expiry
//!
//! Values are produced on demand by a caller-supplied loader and kept until
//! capacity pressure evicts them. Stale entries are reloaded lazily on access.

pub mod cache;
pub mod config;
pub mod error;
pub mod key;
pub mod resolver;
pub mod source;

pub use cache::{Cache, CacheStats, LoadError, Loaded, Loader};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use key::CacheKey;
pub use resolver::{CachedResolver, Mx, Resolve, Srv, SrvRecords, SystemResolver};
pub use source::SourceCache;
