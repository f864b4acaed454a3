//! TTL cache for slow-moving quote provider data.
//!
//! The provider client owns one of these for company classification data
//! (sector/industry/beta), which changes on the order of quarters, not
//! ticks. Invalidation contract: entries expire after the configured TTL,
//! and callers can drop a symbol (`invalidate`) or everything (`clear`)
//! explicitly.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

struct CacheEntry<T> {
    value: T,
    expires_at: Option<DateTime<Utc>>,
}

pub struct QuoteCache<T> {
    entries: DashMap<String, CacheEntry<T>>,
    ttl: Option<Duration>,
}

impl<T: Clone> QuoteCache<T> {
    /// Create a cache whose entries expire after `ttl_hours`.
    /// A TTL of zero (or less) means entries never expire.
    pub fn new(ttl_hours: i64) -> Self {
        let ttl = (ttl_hours > 0).then(|| Duration::hours(ttl_hours));
        Self::with_ttl(ttl)
    }

    fn with_ttl(ttl: Option<Duration>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Look up a symbol, dropping the entry if it has expired
    pub fn get(&self, symbol: &str) -> Option<T> {
        let expired = match self.entries.get(symbol) {
            Some(entry) => match entry.expires_at {
                Some(expires_at) => Utc::now() >= expires_at,
                None => false,
            },
            None => return None,
        };

        if expired {
            self.entries.remove(symbol);
            return None;
        }

        self.entries.get(symbol).map(|entry| entry.value.clone())
    }

    pub fn insert(&self, symbol: &str, value: T) {
        let expires_at = self.ttl.map(|ttl| Utc::now() + ttl);
        self.entries
            .insert(symbol.to_string(), CacheEntry { value, expires_at });
    }

    /// Drop one symbol. Returns whether an entry was present.
    pub fn invalidate(&self, symbol: &str) -> bool {
        self.entries.remove(symbol).is_some()
    }

    /// Drop everything
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_returns_values() {
        let cache = QuoteCache::new(1);
        cache.insert("AAPL", 42u32);
        assert_eq!(cache.get("AAPL"), Some(42));
        assert_eq!(cache.get("MSFT"), None);
    }

    #[test]
    fn zero_ttl_never_expires() {
        let cache = QuoteCache::new(0);
        cache.insert("AAPL", 1u32);
        assert_eq!(cache.get("AAPL"), Some(1));
    }

    #[test]
    fn expired_entries_are_dropped_on_read() {
        // Negative TTL puts the expiry in the past immediately
        let cache = QuoteCache::with_ttl(Some(Duration::hours(-1)));
        cache.insert("AAPL", 1u32);
        assert_eq!(cache.get("AAPL"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_and_clear() {
        let cache = QuoteCache::new(1);
        cache.insert("AAPL", 1u32);
        cache.insert("MSFT", 2u32);

        assert!(cache.invalidate("AAPL"));
        assert!(!cache.invalidate("AAPL"));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
