//! Error types for the consumer layer
//!
//! The core cache never invents errors of its own: it hands back whatever the
//! loader produced as a [`LoadError`](crate::cache::LoadError). Consumers
//! flatten that into [`CacheError`].

use thiserror::Error;

use crate::cache::LoadError;

/// Boxed error accepted from loaders.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// == Cache Error Enum ==
/// Unified error type for the consumer caches.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Arguments could not be encoded into (or decoded from) a cache key
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// The loader failed to produce a value
    #[error("Load failed: {0}")]
    Load(#[source] BoxError),
}

impl<V> From<LoadError<V>> for CacheError {
    fn from(err: LoadError<V>) -> Self {
        CacheError::Load(err.source)
    }
}

// == Result Type Alias ==
/// Convenience Result type for the consumer caches.
pub type Result<T> = std::result::Result<T, CacheError>;
