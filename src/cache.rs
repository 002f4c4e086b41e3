//! Time-bounded price cache.
//!
//! The nisab service reads and writes metal prices through the `PriceCache`
//! trait so that callers can plug in whatever store their process already
//! shares. `MemoryCache` is the in-process implementation.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::types::ZakatError;

/// Cache key for the gold price per gram.
pub const GOLD_PRICE_KEY: &str = "zakat.gold_price";
/// Cache key for the silver price per gram.
pub const SILVER_PRICE_KEY: &str = "zakat.silver_price";

pub trait PriceCache {
    /// Returns the cached value for `key` if present and not expired.
    fn get(&self, key: &str) -> Result<Option<Decimal>, ZakatError>;

    /// Stores `value` under `key` for `ttl`.
    fn put(&self, key: &str, value: Decimal, ttl: Duration) -> Result<(), ZakatError>;

    /// Returns the cached value, or computes it, stores it for `ttl` and returns it.
    fn remember(
        &self,
        key: &str,
        ttl: Duration,
        compute: &mut dyn FnMut() -> Decimal,
    ) -> Result<Decimal, ZakatError> {
        if let Some(value) = self.get(key)? {
            return Ok(value);
        }
        let value = compute();
        self.put(key, value, ttl)?;
        Ok(value)
    }

    /// Drops `key` from the cache. Missing keys are not an error.
    fn forget(&self, key: &str) -> Result<(), ZakatError>;
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    value: Decimal,
    expires_at: Instant,
}

/// Process-local cache guarded by an `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries. Expired entries linger until the next write.
    pub fn len(&self) -> usize {
        self.entries.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> ZakatError {
    ZakatError::Cache("price cache lock poisoned".to_string())
}

impl PriceCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<Decimal>, ZakatError> {
        let guard = self.entries.read().map_err(poisoned)?;
        Ok(guard
            .get(key)
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.value))
    }

    fn put(&self, key: &str, value: Decimal, ttl: Duration) -> Result<(), ZakatError> {
        // A TTL too large to represent is treated as "never expires".
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + Duration::from_secs(60 * 60 * 24 * 365 * 100));

        let mut guard = self.entries.write().map_err(poisoned)?;
        guard.retain(|_, entry| now < entry.expires_at);
        guard.insert(key.to_string(), CacheEntry { value, expires_at });
        Ok(())
    }

    fn forget(&self, key: &str) -> Result<(), ZakatError> {
        let mut guard = self.entries.write().map_err(poisoned)?;
        guard.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_put_then_get() {
        let cache = MemoryCache::new();
        cache.put(GOLD_PRICE_KEY, dec!(65.5), Duration::from_secs(60)).unwrap();
        assert_eq!(cache.get(GOLD_PRICE_KEY).unwrap(), Some(dec!(65.5)));
        assert_eq!(cache.get(SILVER_PRICE_KEY).unwrap(), None);
    }

    #[test]
    fn test_expired_entries_are_misses() {
        let cache = MemoryCache::new();
        cache.put(GOLD_PRICE_KEY, dec!(65.5), Duration::ZERO).unwrap();
        assert_eq!(cache.get(GOLD_PRICE_KEY).unwrap(), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_writes_drop_expired_entries() {
        let cache = MemoryCache::new();
        cache.put(GOLD_PRICE_KEY, dec!(65.5), Duration::ZERO).unwrap();
        cache.put("zakat.platinum_price", dec!(30), Duration::ZERO).unwrap();
        cache.put(SILVER_PRICE_KEY, dec!(0.85), Duration::from_secs(60)).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(SILVER_PRICE_KEY).unwrap(), Some(dec!(0.85)));
    }

    #[test]
    fn test_remember_computes_once() {
        let cache = MemoryCache::new();
        let mut calls = 0;
        let mut compute = || {
            calls += 1;
            dec!(100)
        };

        let first = cache.remember(GOLD_PRICE_KEY, Duration::from_secs(60), &mut compute).unwrap();
        let second = cache.remember(GOLD_PRICE_KEY, Duration::from_secs(60), &mut compute).unwrap();

        assert_eq!(first, dec!(100));
        assert_eq!(second, dec!(100));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_remember_returns_cached_value() {
        let cache = MemoryCache::new();
        cache.put(SILVER_PRICE_KEY, dec!(0.85), Duration::from_secs(60)).unwrap();
        let value = cache
            .remember(SILVER_PRICE_KEY, Duration::from_secs(60), &mut || dec!(10))
            .unwrap();
        assert_eq!(value, dec!(0.85));
    }

    #[test]
    fn test_forget() {
        let cache = MemoryCache::new();
        cache.put(GOLD_PRICE_KEY, dec!(1), Duration::from_secs(60)).unwrap();
        cache.forget(GOLD_PRICE_KEY).unwrap();
        cache.forget("zakat.unknown").unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let cache = MemoryCache::new();
        cache.put(GOLD_PRICE_KEY, dec!(1), Duration::MAX).unwrap();
        assert_eq!(cache.get(GOLD_PRICE_KEY).unwrap(), Some(dec!(1)));
    }
}
