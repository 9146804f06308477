//! Rate caching with a bounded freshness window.

use cambio_common::{time::constants, CurrencyCode};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::rate::{ConversionRate, RateSource};

/// Cached rate entry.
#[derive(Debug, Clone)]
struct CacheEntry {
    rate: ConversionRate,
    cached_at: DateTime<Utc>,
    ttl: Duration,
}

impl CacheEntry {
    fn new(rate: ConversionRate, ttl: Duration) -> Self {
        Self {
            rate,
            cached_at: Utc::now(),
            ttl,
        }
    }

    fn is_fresh(&self) -> bool {
        let age = Utc::now().signed_duration_since(self.cached_at);
        age < self.ttl
    }
}

/// Configuration for the rate cache.
#[derive(Debug, Clone)]
pub struct RateCacheConfig {
    /// Freshness window for cached rates.
    pub ttl: Duration,
    /// Hard cap on cached entries; the oldest entry is dropped when an
    /// insert would exceed it.
    pub max_entries: usize,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            ttl: constants::cache_duration(),
            max_entries: 256,
        }
    }
}

/// Thread-safe rate cache.
///
/// Keys are direction-sensitive: a cached `USD-VES` entry never answers a
/// `VES-USD` lookup. An expired entry behaves exactly like a missing one.
pub struct RateCache {
    entries: DashMap<String, CacheEntry>,
    config: RateCacheConfig,
}

impl RateCache {
    /// Create a cache with the default 5-minute window.
    pub fn new() -> Self {
        Self::with_config(RateCacheConfig::default())
    }

    pub fn with_config(config: RateCacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
        }
    }

    /// Get a fresh cached rate, if any.
    pub fn get(&self, from: &CurrencyCode, to: &CurrencyCode) -> Option<ConversionRate> {
        let key = Self::cache_key(from, to);

        if let Some(entry) = self.entries.get(&key) {
            if entry.is_fresh() {
                debug!(pair = %key, "Cache hit");
                return Some(entry.rate.clone());
            }
            debug!(pair = %key, "Cache entry expired");
            drop(entry);
            self.entries.remove(&key);
        }

        debug!(pair = %key, "Cache miss");
        None
    }

    /// Store a rate, overwriting any prior entry for the pair.
    pub fn insert(&self, rate: ConversionRate) {
        self.insert_with_ttl(rate, self.config.ttl);
    }

    /// Store a rate with a custom freshness window.
    ///
    /// At capacity, expired entries are evicted first; if every entry is
    /// still fresh the oldest one is dropped, so the cache never exceeds
    /// `max_entries`.
    pub fn insert_with_ttl(&self, rate: ConversionRate, ttl: Duration) {
        let key = Self::cache_key(&rate.from, &rate.to);

        if !self.entries.contains_key(&key) && self.entries.len() >= self.config.max_entries {
            self.evict_expired();
            while self.entries.len() >= self.config.max_entries {
                let oldest = self
                    .entries
                    .iter()
                    .min_by_key(|entry| entry.cached_at)
                    .map(|entry| entry.key().clone());
                match oldest {
                    Some(oldest) => self.entries.remove(&oldest),
                    None => break,
                };
            }
        }

        self.entries.insert(key, CacheEntry::new(rate, ttl));
    }

    /// Convenience insert from raw parts.
    pub fn insert_rate(
        &self,
        from: CurrencyCode,
        to: CurrencyCode,
        rate: rust_decimal::Decimal,
        source: RateSource,
    ) {
        self.insert(ConversionRate::new(from, to, rate, source));
    }

    /// Drop both directions of a pair.
    pub fn remove_pair(&self, a: &CurrencyCode, b: &CurrencyCode) {
        self.entries.remove(&Self::cache_key(a, b));
        self.entries.remove(&Self::cache_key(b, a));
    }

    /// Clear all cached rates.
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evict entries that fell out of the freshness window.
    pub fn evict_expired(&self) {
        self.entries.retain(|_, entry| entry.is_fresh());
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let total = self.entries.len();
        let fresh = self.entries.iter().filter(|e| e.is_fresh()).count();

        CacheStats {
            total_entries: total,
            fresh_entries: fresh,
            expired_entries: total - fresh,
        }
    }

    fn cache_key(from: &CurrencyCode, to: &CurrencyCode) -> String {
        format!("{from}-{to}")
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub total_entries: usize,
    pub fresh_entries: usize,
    pub expired_entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::thread::sleep;
    use std::time::Duration as StdDuration;

    fn usd_ves() -> ConversionRate {
        ConversionRate::new("USD", "VES", dec!(91.50), RateSource::Manual)
    }

    #[test]
    fn test_insert_and_get() {
        let cache = RateCache::new();
        cache.insert(usd_ves());

        let hit = cache
            .get(&CurrencyCode::usd(), &CurrencyCode::ves())
            .unwrap();
        assert_eq!(hit.rate, dec!(91.50));
    }

    #[test]
    fn test_direction_sensitive() {
        let cache = RateCache::new();
        cache.insert(usd_ves());

        assert!(cache.get(&CurrencyCode::ves(), &CurrencyCode::usd()).is_none());
    }

    #[test]
    fn test_expiry() {
        let config = RateCacheConfig {
            ttl: Duration::milliseconds(50),
            ..Default::default()
        };
        let cache = RateCache::with_config(config);
        cache.insert(usd_ves());

        assert!(cache.get(&CurrencyCode::usd(), &CurrencyCode::ves()).is_some());

        sleep(StdDuration::from_millis(60));

        assert!(cache.get(&CurrencyCode::usd(), &CurrencyCode::ves()).is_none());
        // Expired entry was dropped on read.
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_overwrite() {
        let cache = RateCache::new();
        cache.insert(usd_ves());
        cache.insert(ConversionRate::new(
            "USD",
            "VES",
            dec!(92.00),
            RateSource::Calculated,
        ));

        let hit = cache
            .get(&CurrencyCode::usd(), &CurrencyCode::ves())
            .unwrap();
        assert_eq!(hit.rate, dec!(92.00));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_capacity_enforced_on_fresh_entries() {
        let config = RateCacheConfig {
            max_entries: 2,
            ..Default::default()
        };
        let cache = RateCache::with_config(config);

        cache.insert(ConversionRate::new("USD", "VES", dec!(91.50), RateSource::Manual));
        sleep(StdDuration::from_millis(2));
        cache.insert(ConversionRate::new("USD", "EUR", dec!(0.92), RateSource::Calculated));
        sleep(StdDuration::from_millis(2));
        cache.insert(ConversionRate::new("USD", "COP", dec!(4150), RateSource::Calculated));

        // All entries were fresh; the oldest made room.
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&CurrencyCode::usd(), &CurrencyCode::ves()).is_none());
        assert!(cache.get(&CurrencyCode::usd(), &CurrencyCode::cop()).is_some());

        // Overwriting a resident pair never evicts a neighbor.
        cache.insert(ConversionRate::new("USD", "COP", dec!(4200), RateSource::Manual));
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&CurrencyCode::usd(), &CurrencyCode::eur()).is_some());
    }

    #[test]
    fn test_remove_pair_both_directions() {
        let cache = RateCache::new();
        cache.insert(usd_ves());
        cache.insert(usd_ves().inverted());
        assert_eq!(cache.len(), 2);

        cache.remove_pair(&CurrencyCode::usd(), &CurrencyCode::ves());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_stats() {
        let cache = RateCache::new();
        cache.insert(usd_ves());
        cache.insert_with_ttl(usd_ves().inverted(), Duration::milliseconds(1));

        sleep(StdDuration::from_millis(5));

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.fresh_entries, 1);
        assert_eq!(stats.expired_entries, 1);
    }
}
