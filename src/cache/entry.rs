//! Cache Entry Module
//!
//! Defines a single cached value together with its refresh time and TTL override.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct Entry<V> {
    /// Key the entry is indexed under
    pub key: String,
    /// The stored value
    pub value: V,
    /// Time of the last (re)computation
    pub refreshed_at: Instant,
    /// Per-entry TTL, None = defer to the cache-wide TTL
    pub ttl: Option<Duration>,
}

impl<V> Entry<V> {
    // == Constructor ==
    /// Creates a new entry refreshed at `now`.
    ///
    /// A zero `ttl` is treated the same as no override.
    pub fn new(key: String, value: V, ttl: Option<Duration>, now: Instant) -> Self {
        Self {
            key,
            value,
            refreshed_at: now,
            ttl: normalize_ttl(ttl),
        }
    }

    // == Refresh ==
    /// Overwrites the value, refresh time and TTL override in place.
    pub fn refresh(&mut self, value: V, ttl: Option<Duration>, now: Instant) {
        self.value = value;
        self.refreshed_at = now;
        self.ttl = normalize_ttl(ttl);
    }

    // == Is Expired ==
    /// Checks if the entry is stale at `now`.
    ///
    /// The global rule and the per-entry rule are independent: the entry is
    /// expired as soon as either one has strictly elapsed.
    pub fn is_expired(&self, global_ttl: Option<Duration>, now: Instant) -> bool {
        let age = now.saturating_duration_since(self.refreshed_at);
        global_ttl.is_some_and(|ttl| age > ttl) || self.ttl.is_some_and(|ttl| age > ttl)
    }

    // == Time To Live ==
    /// Returns the time left before the entry goes stale.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the entry is already stale
    /// - `Some(remaining)` for the stricter of the two rules otherwise
    /// - `None` if neither rule applies (never expires)
    pub fn ttl_remaining(&self, global_ttl: Option<Duration>, now: Instant) -> Option<Duration> {
        let limit = match (global_ttl, self.ttl) {
            (Some(global), Some(own)) => global.min(own),
            (Some(ttl), None) | (None, Some(ttl)) => ttl,
            (None, None) => return None,
        };
        let age = now.saturating_duration_since(self.refreshed_at);
        Some(limit.saturating_sub(age))
    }
}

/// Collapses a zero duration to "no TTL".
pub(crate) fn normalize_ttl(ttl: Option<Duration>) -> Option<Duration> {
    ttl.filter(|d| !d.is_zero())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    fn entry(ttl: Option<Duration>, at: Instant) -> Entry<&'static str> {
        Entry::new("key".to_string(), "value", ttl, at)
    }

    #[test]
    fn test_entry_creation_no_ttl() {
        let now = Instant::now();
        let entry = entry(None, now);

        assert_eq!(entry.value, "value");
        assert!(entry.ttl.is_none());
        assert!(!entry.is_expired(None, now + Duration::from_secs(3600)));
    }

    #[test]
    fn test_zero_ttl_means_no_override() {
        let entry = entry(Some(Duration::ZERO), Instant::now());
        assert!(entry.ttl.is_none());
    }

    #[test]
    fn test_global_ttl_expiry() {
        let t0 = Instant::now();
        let entry = entry(None, t0);
        let global = Some(10 * MS);

        assert!(!entry.is_expired(global, t0 + 5 * MS));
        // Boundary: exactly at the TTL the entry is still fresh
        assert!(!entry.is_expired(global, t0 + 10 * MS));
        assert!(entry.is_expired(global, t0 + 11 * MS));
    }

    #[test]
    fn test_entry_ttl_overrides_longer_global() {
        let t0 = Instant::now();
        let entry = entry(Some(MS), t0);

        assert!(entry.is_expired(Some(10 * MS), t0 + 2 * MS));
    }

    #[test]
    fn test_global_ttl_applies_even_with_longer_override() {
        let t0 = Instant::now();
        let entry = entry(Some(10 * MS), t0);

        // Either rule alone is enough
        assert!(entry.is_expired(Some(MS), t0 + 2 * MS));
        assert!(!entry.is_expired(None, t0 + 2 * MS));
    }

    #[test]
    fn test_refresh_resets_clock() {
        let t0 = Instant::now();
        let mut entry = entry(Some(MS), t0);
        assert!(entry.is_expired(None, t0 + 5 * MS));

        entry.refresh("fresh", None, t0 + 5 * MS);
        assert_eq!(entry.value, "fresh");
        assert!(entry.ttl.is_none());
        assert!(!entry.is_expired(None, t0 + 100 * MS));
    }

    #[test]
    fn test_ttl_remaining() {
        let t0 = Instant::now();
        let entry = entry(Some(30 * MS), t0);

        assert_eq!(entry.ttl_remaining(None, t0 + 10 * MS), Some(20 * MS));
        assert_eq!(entry.ttl_remaining(Some(15 * MS), t0 + 10 * MS), Some(5 * MS));
        assert_eq!(entry.ttl_remaining(None, t0 + 40 * MS), Some(Duration::ZERO));
    }

    #[test]
    fn test_ttl_remaining_no_expiration() {
        let entry = entry(None, Instant::now());
        assert!(entry.ttl_remaining(None, Instant::now()).is_none());
    }
}
