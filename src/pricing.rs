//! Metal prices and nisab thresholds.
//!
//! `NisabService` is the single source of truth for the current gold and
//! silver prices and for every threshold or rate derived from configuration.
//! Prices are loaded once at construction, from the shared `PriceCache` when
//! caching is enabled or straight from configuration otherwise, and can be
//! replaced with the setters or refreshed from an async `PriceProvider`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::{PriceCache, GOLD_PRICE_KEY, SILVER_PRICE_KEY};
use crate::config::{ZakatConfig, WASQS_PER_NISAB};
use crate::inputs::{non_negative, IntoZakatDecimal};
use crate::types::ZakatError;

/// Where a price value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    /// Read from configuration defaults (cache disabled, or cache miss).
    Config,
    /// A live cache entry.
    Cache,
    /// Set explicitly by the caller or a price provider.
    Manual,
    /// The cache failed; configuration defaults were used instead.
    CacheUnavailable,
}

/// Current market prices for metals used in Zakat calculations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prices {
    /// Gold price per gram in local currency.
    pub gold_per_gram: Decimal,
    /// Silver price per gram in local currency.
    pub silver_per_gram: Decimal,
}

impl Prices {
    pub fn new(
        gold_per_gram: impl IntoZakatDecimal,
        silver_per_gram: impl IntoZakatDecimal,
    ) -> Result<Self, ZakatError> {
        Ok(Self {
            gold_per_gram: non_negative(gold_per_gram, "gold price")?,
            silver_per_gram: non_negative(silver_per_gram, "silver price")?,
        })
    }
}

/// Prices used by a calculation together with their origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub gold_per_gram: Decimal,
    pub silver_per_gram: Decimal,
    pub gold_source: PriceSource,
    pub silver_source: PriceSource,
}

/// Trait for fetching current metal prices from an external source.
///
/// Implementors might wrap a REST API, a database or static test data.
#[cfg(feature = "async")]
#[async_trait::async_trait]
pub trait PriceProvider: Send + Sync {
    async fn get_prices(&self) -> Result<Prices, ZakatError>;
}

/// A price provider that always returns the same prices.
#[derive(Debug, Clone)]
pub struct StaticPriceProvider {
    prices: Prices,
}

impl StaticPriceProvider {
    pub fn new(
        gold_per_gram: impl IntoZakatDecimal,
        silver_per_gram: impl IntoZakatDecimal,
    ) -> Result<Self, ZakatError> {
        Ok(Self {
            prices: Prices::new(gold_per_gram, silver_per_gram)?,
        })
    }

    pub fn from_prices(prices: Prices) -> Self {
        Self { prices }
    }
}

#[cfg(feature = "async")]
#[async_trait::async_trait]
impl PriceProvider for StaticPriceProvider {
    async fn get_prices(&self) -> Result<Prices, ZakatError> {
        Ok(self.prices.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Metal {
    Gold,
    Silver,
}

impl Metal {
    fn cache_key(self) -> &'static str {
        match self {
            Metal::Gold => GOLD_PRICE_KEY,
            Metal::Silver => SILVER_PRICE_KEY,
        }
    }

    fn field(self) -> &'static str {
        match self {
            Metal::Gold => "gold price",
            Metal::Silver => "silver price",
        }
    }

    fn default_price(self, config: &ZakatConfig) -> Decimal {
        match self {
            Metal::Gold => config.default_gold_price,
            Metal::Silver => config.default_silver_price,
        }
    }
}

/// Price and threshold provider.
pub struct NisabService {
    config: Arc<ZakatConfig>,
    cache: Arc<dyn PriceCache + Send + Sync>,
    gold_price: Decimal,
    silver_price: Decimal,
    gold_source: PriceSource,
    silver_source: PriceSource,
}

impl std::fmt::Debug for NisabService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NisabService")
            .field("gold_price", &self.gold_price)
            .field("silver_price", &self.silver_price)
            .field("gold_source", &self.gold_source)
            .field("silver_source", &self.silver_source)
            .finish_non_exhaustive()
    }
}

impl NisabService {
    /// Creates the service and loads the default prices.
    pub fn new(config: impl Into<Arc<ZakatConfig>>, cache: Arc<dyn PriceCache + Send + Sync>) -> Self {
        let config = config.into();
        let mut service = Self {
            gold_price: config.default_gold_price,
            silver_price: config.default_silver_price,
            gold_source: PriceSource::Config,
            silver_source: PriceSource::Config,
            config,
            cache,
        };
        service.load_default_prices();
        service
    }

    pub fn config(&self) -> &ZakatConfig {
        &self.config
    }

    /// Reloads both prices from the cache (compute-if-absent against the
    /// configured defaults) or, with caching disabled, from configuration.
    pub fn load_default_prices(&mut self) {
        let (gold, gold_source) = self.load_price(Metal::Gold);
        let (silver, silver_source) = self.load_price(Metal::Silver);
        self.gold_price = gold;
        self.gold_source = gold_source;
        self.silver_price = silver;
        self.silver_source = silver_source;
        debug!(%gold, ?gold_source, %silver, ?silver_source, "Loaded default metal prices");
    }

    fn load_price(&self, metal: Metal) -> (Decimal, PriceSource) {
        let fallback = metal.default_price(&self.config);
        if !self.config.cache.enabled {
            return (fallback, PriceSource::Config);
        }

        let computed = Cell::new(false);
        let mut compute = || {
            computed.set(true);
            fallback
        };
        match self.cache.remember(metal.cache_key(), self.config.cache.ttl(), &mut compute) {
            Ok(price) if price < Decimal::ZERO => {
                warn!(key = metal.cache_key(), %price, "Ignoring negative cached price; using configured default");
                (fallback, PriceSource::CacheUnavailable)
            }
            Ok(price) if computed.get() => (price, PriceSource::Config),
            Ok(price) => (price, PriceSource::Cache),
            Err(e) => {
                warn!(key = metal.cache_key(), error = %e, "Price cache unavailable; using configured default");
                (fallback, PriceSource::CacheUnavailable)
            }
        }
    }

    pub fn set_gold_price(&mut self, price: impl IntoZakatDecimal) -> Result<&mut Self, ZakatError> {
        let price = self.store_price(Metal::Gold, price)?;
        self.gold_price = price;
        self.gold_source = PriceSource::Manual;
        Ok(self)
    }

    pub fn set_silver_price(&mut self, price: impl IntoZakatDecimal) -> Result<&mut Self, ZakatError> {
        let price = self.store_price(Metal::Silver, price)?;
        self.silver_price = price;
        self.silver_source = PriceSource::Manual;
        Ok(self)
    }

    // Validates and writes through to the cache; the caller only updates its
    // own state once this succeeded.
    fn store_price(&self, metal: Metal, price: impl IntoZakatDecimal) -> Result<Decimal, ZakatError> {
        let price = non_negative(price, metal.field())?;
        self.cache.put(metal.cache_key(), price, self.config.cache.ttl())?;
        debug!(key = metal.cache_key(), %price, "Stored metal price");
        Ok(price)
    }

    /// Applies prices fetched from `provider`.
    #[cfg(feature = "async")]
    pub async fn refresh_prices<P: PriceProvider + ?Sized>(&mut self, provider: &P) -> Result<(), ZakatError> {
        let prices = provider.get_prices().await?;
        let prices = Prices::new(prices.gold_per_gram, prices.silver_per_gram)?;

        // Both cache writes must land before either price changes.
        let gold = self.store_price(Metal::Gold, prices.gold_per_gram)?;
        let silver = match self.store_price(Metal::Silver, prices.silver_per_gram) {
            Ok(silver) => silver,
            Err(e) => {
                if let Err(restore) = self.cache.put(GOLD_PRICE_KEY, self.gold_price, self.config.cache.ttl()) {
                    warn!(error = %restore, "Failed to restore cached gold price after partial refresh");
                }
                return Err(e);
            }
        };

        self.gold_price = gold;
        self.gold_source = PriceSource::Manual;
        self.silver_price = silver;
        self.silver_source = PriceSource::Manual;
        Ok(())
    }

    pub fn gold_price(&self) -> Decimal {
        self.gold_price
    }

    pub fn silver_price(&self) -> Decimal {
        self.silver_price
    }

    pub fn gold_price_source(&self) -> PriceSource {
        self.gold_source
    }

    pub fn silver_price_source(&self) -> PriceSource {
        self.silver_source
    }

    pub fn prices(&self) -> PriceSnapshot {
        PriceSnapshot {
            gold_per_gram: self.gold_price,
            silver_per_gram: self.silver_price,
            gold_source: self.gold_source,
            silver_source: self.silver_source,
        }
    }

    /// Nisab gold weight × gold price.
    pub fn gold_nisab_value(&self) -> Result<Decimal, ZakatError> {
        self.config
            .nisab_gold_grams
            .checked_mul(self.gold_price)
            .ok_or_else(|| ZakatError::overflow("gold nisab value"))
    }

    /// Nisab silver weight × silver price.
    pub fn silver_nisab_value(&self) -> Result<Decimal, ZakatError> {
        self.config
            .nisab_silver_grams
            .checked_mul(self.silver_price)
            .ok_or_else(|| ZakatError::overflow("silver nisab value"))
    }

    /// Classical cash/business threshold, measured in silver.
    pub fn cash_nisab_value(&self) -> Result<Decimal, ZakatError> {
        self.silver_nisab_value()
    }

    /// Wasq weight in kg for `crop`.
    pub fn agricultural_nisab_weight(&self, crop: &str) -> Decimal {
        self.config.wasq_weight(crop)
    }

    /// Five wasqs of `crop`, in kg.
    pub fn agricultural_nisab_threshold(&self, crop: &str) -> Decimal {
        self.agricultural_nisab_weight(crop).saturating_mul(WASQS_PER_NISAB)
    }

    /// True when `weight_kg` reaches five wasqs of `crop` (boundary inclusive).
    pub fn check_agricultural_nisab(&self, crop: &str, weight_kg: Decimal) -> bool {
        weight_kg >= self.agricultural_nisab_threshold(crop)
    }

    pub fn agricultural_zakat_rate(&self, is_irrigated: bool) -> Decimal {
        self.config.agricultural_rate(is_irrigated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::config::CacheSettings;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    struct BrokenCache;

    impl PriceCache for BrokenCache {
        fn get(&self, _key: &str) -> Result<Option<Decimal>, ZakatError> {
            Err(ZakatError::Cache("connection refused".to_string()))
        }

        fn put(&self, _key: &str, _value: Decimal, _ttl: Duration) -> Result<(), ZakatError> {
            Err(ZakatError::Cache("connection refused".to_string()))
        }

        fn forget(&self, _key: &str) -> Result<(), ZakatError> {
            Ok(())
        }
    }

    /// Accepts gold writes, rejects silver writes.
    #[cfg(feature = "async")]
    #[derive(Default)]
    struct SilverWriteFails {
        inner: MemoryCache,
    }

    #[cfg(feature = "async")]
    impl PriceCache for SilverWriteFails {
        fn get(&self, key: &str) -> Result<Option<Decimal>, ZakatError> {
            self.inner.get(key)
        }

        fn put(&self, key: &str, value: Decimal, ttl: Duration) -> Result<(), ZakatError> {
            if key == SILVER_PRICE_KEY {
                return Err(ZakatError::Cache("down".to_string()));
            }
            self.inner.put(key, value, ttl)
        }

        fn forget(&self, key: &str) -> Result<(), ZakatError> {
            self.inner.forget(key)
        }
    }

    fn service() -> NisabService {
        NisabService::new(ZakatConfig::default(), Arc::new(MemoryCache::new()))
    }

    #[test]
    fn test_defaults_loaded_through_cache() {
        let cache = Arc::new(MemoryCache::new());
        let service = NisabService::new(ZakatConfig::default(), cache.clone());

        assert_eq!(service.gold_price(), dec!(100));
        assert_eq!(service.silver_price(), dec!(10));
        assert_eq!(service.gold_price_source(), PriceSource::Config);
        assert_eq!(cache.get(GOLD_PRICE_KEY).unwrap(), Some(dec!(100)));
        assert_eq!(cache.get(SILVER_PRICE_KEY).unwrap(), Some(dec!(10)));
    }

    #[test]
    fn test_cached_prices_win_over_defaults() {
        let cache = Arc::new(MemoryCache::new());
        cache.put(GOLD_PRICE_KEY, dec!(72.5), Duration::from_secs(60)).unwrap();

        let service = NisabService::new(ZakatConfig::default(), cache);
        assert_eq!(service.gold_price(), dec!(72.5));
        assert_eq!(service.gold_price_source(), PriceSource::Cache);
        assert_eq!(service.silver_price_source(), PriceSource::Config);
    }

    #[test]
    fn test_cache_disabled_reads_config() {
        let cache = Arc::new(MemoryCache::new());
        cache.put(GOLD_PRICE_KEY, dec!(72.5), Duration::from_secs(60)).unwrap();
        let config = ZakatConfig::default()
            .with_cache(CacheSettings { enabled: false, ttl_seconds: 3600 });

        let service = NisabService::new(config, cache);
        assert_eq!(service.gold_price(), dec!(100));
        assert_eq!(service.gold_price_source(), PriceSource::Config);
    }

    #[test]
    fn test_cache_failure_is_surfaced() {
        let service = NisabService::new(ZakatConfig::default(), Arc::new(BrokenCache));
        assert_eq!(service.gold_price(), dec!(100));
        assert_eq!(service.gold_price_source(), PriceSource::CacheUnavailable);
        assert_eq!(service.silver_price_source(), PriceSource::CacheUnavailable);
    }

    #[test]
    fn test_failed_cache_write_leaves_price_unchanged() {
        let mut service = NisabService::new(ZakatConfig::default(), Arc::new(BrokenCache));
        let err = service.set_gold_price(50).unwrap_err();
        assert!(matches!(err, ZakatError::Cache(_)));
        assert_eq!(service.gold_price(), dec!(100));
    }

    #[test]
    fn test_set_and_get_prices() {
        let mut service = service();
        service.set_gold_price(50).unwrap().set_silver_price(0.5).unwrap();
        assert_eq!(service.gold_price(), dec!(50));
        assert_eq!(service.silver_price(), dec!(0.5));
        assert_eq!(service.gold_price_source(), PriceSource::Manual);
    }

    #[test]
    fn test_set_price_writes_cache() {
        let cache = Arc::new(MemoryCache::new());
        let mut service = NisabService::new(ZakatConfig::default(), cache.clone());
        service.set_silver_price(dec!(0.85)).unwrap();
        assert_eq!(cache.get(SILVER_PRICE_KEY).unwrap(), Some(dec!(0.85)));
    }

    #[test]
    fn test_negative_prices_rejected() {
        let mut service = service();
        assert_eq!(service.set_gold_price(-100).unwrap_err(), ZakatError::negative("gold price"));
        assert_eq!(service.set_silver_price(-10).unwrap_err(), ZakatError::negative("silver price"));
        assert_eq!(service.gold_price(), dec!(100));
        assert_eq!(service.silver_price(), dec!(10));
    }

    #[test]
    fn test_nisab_values() {
        let mut service = service();
        service.set_gold_price(100).unwrap().set_silver_price(10).unwrap();
        assert_eq!(service.gold_nisab_value().unwrap(), dec!(8500));
        assert_eq!(service.silver_nisab_value().unwrap(), dec!(5950));
        assert_eq!(service.cash_nisab_value().unwrap(), dec!(5950));
    }

    #[test]
    fn test_agricultural_thresholds() {
        let config = ZakatConfig::default().with_wasq_weight("dates", 65).unwrap();
        let service = NisabService::new(config, Arc::new(MemoryCache::new()));

        assert_eq!(service.agricultural_nisab_weight("wheat"), dec!(60));
        assert_eq!(service.agricultural_nisab_threshold("wheat"), dec!(300));
        assert_eq!(service.agricultural_nisab_threshold("dates"), dec!(325));
        assert!(service.check_agricultural_nisab("wheat", dec!(300)));
        assert!(!service.check_agricultural_nisab("wheat", dec!(299.99)));
        assert!(!service.check_agricultural_nisab("dates", dec!(300)));
    }

    #[test]
    fn test_agricultural_rates() {
        let service = service();
        assert_eq!(service.agricultural_zakat_rate(true), dec!(0.05));
        assert_eq!(service.agricultural_zakat_rate(false), dec!(0.1));
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_refresh_from_provider() {
        let mut service = service();
        let provider = StaticPriceProvider::new(65, 0.8).unwrap();
        service.refresh_prices(&provider).await.unwrap();
        assert_eq!(service.gold_price(), dec!(65));
        assert_eq!(service.silver_price(), dec!(0.8));
        assert_eq!(service.silver_price_source(), PriceSource::Manual);
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_refresh_rejects_negative_prices() {
        let mut service = service();
        let provider = StaticPriceProvider::from_prices(Prices {
            gold_per_gram: dec!(65),
            silver_per_gram: dec!(-1),
        });
        assert!(service.refresh_prices(&provider).await.is_err());
        assert_eq!(service.gold_price(), dec!(100));
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_refresh_is_all_or_nothing_when_a_write_fails() {
        let cache = Arc::new(SilverWriteFails::default());
        cache.inner.put(GOLD_PRICE_KEY, dec!(100), Duration::from_secs(60)).unwrap();
        let mut service = NisabService::new(ZakatConfig::default(), cache.clone());
        assert_eq!(service.gold_price_source(), PriceSource::Cache);

        let provider = StaticPriceProvider::new(50, 0.5).unwrap();
        let err = service.refresh_prices(&provider).await.unwrap_err();
        assert!(matches!(err, ZakatError::Cache(_)));

        assert_eq!(service.gold_price(), dec!(100));
        assert_eq!(service.gold_price_source(), PriceSource::Cache);
        assert_eq!(service.silver_price(), dec!(10));
        assert_eq!(cache.get(GOLD_PRICE_KEY).unwrap(), Some(dec!(100)));
    }
}
