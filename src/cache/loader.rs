//! Loader Module
//!
//! The contract between the cache and whatever computes its values.

use std::time::Duration;

use thiserror::Error;

use crate::error::BoxError;

// == Loaded ==
/// A freshly computed value plus an optional per-entry TTL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded<V> {
    pub value: V,
    /// Overrides expiry for this entry. None or zero defers to the cache-wide TTL.
    pub ttl: Option<Duration>,
}

impl<V> Loaded<V> {
    /// A value with no TTL override.
    pub fn new(value: V) -> Self {
        Self { value, ttl: None }
    }

    /// A value that goes stale after `ttl`.
    pub fn with_ttl(value: V, ttl: Duration) -> Self {
        Self {
            value,
            ttl: Some(ttl),
        }
    }
}

// == Load Error ==
/// A loader failure.
///
/// A failed load may still carry a partial value; the cache hands both back
/// to the caller and commits neither.
#[derive(Error, Debug)]
#[error("loader failed: {source}")]
pub struct LoadError<V> {
    /// Whatever the loader managed to produce before failing
    pub partial: Option<V>,
    #[source]
    pub source: BoxError,
}

impl<V> LoadError<V> {
    pub fn new(source: impl Into<BoxError>) -> Self {
        Self {
            partial: None,
            source: source.into(),
        }
    }

    /// Attaches a partial value to the failure.
    pub fn with_partial(mut self, value: V) -> Self {
        self.partial = Some(value);
        self
    }

    pub fn into_partial(self) -> Option<V> {
        self.partial
    }
}

/// Result produced by a [`Loader`].
pub type LoadResult<V> = std::result::Result<Loaded<V>, LoadError<V>>;

// == Loader ==
/// Computes the value for a key on a miss or after expiry.
///
/// The cache calls `load` outside its lock, so concurrent misses for the same
/// key may call it more than once. Implementations must tolerate that.
pub trait Loader<V>: Send + Sync {
    fn load(&self, key: &str) -> LoadResult<V>;
}

impl<V, F> Loader<V> for F
where
    F: Fn(&str) -> LoadResult<V> + Send + Sync,
{
    fn load(&self, key: &str) -> LoadResult<V> {
        self(key)
    }
}
