use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;
use strum::{AsRefStr, Display, EnumString};

use crate::inputs::IntoZakatDecimal;
use crate::madhab::Madhab;
use crate::repository::ConfigRepository;
use crate::types::ZakatError;

/// Levy applied to every monetary category (2.5%).
pub const ZAKAT_RATE: Decimal = dec!(0.025);

/// Number of wasqs that make up the agricultural nisab.
pub const WASQS_PER_NISAB: Decimal = dec!(5);

const MAX_PRECISION: u32 = 28;

/// Time-to-live settings for cached metal prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl_seconds: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 3600,
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SymbolPosition {
    #[default]
    Before,
    After,
}

/// Currency shown next to amounts. Never used in arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencySettings {
    pub code: String,
    pub symbol: String,
    pub position: SymbolPosition,
}

impl Default for CurrencySettings {
    fn default() -> Self {
        Self {
            code: "SAR".to_string(),
            symbol: "ر.س".to_string(),
            position: SymbolPosition::Before,
        }
    }
}

impl CurrencySettings {
    /// Formats `amount` with `precision` decimal places and the currency symbol.
    pub fn format(&self, amount: Decimal, precision: u32) -> String {
        let rounded = amount.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
        let number = format!("{:.*}", precision as usize, rounded);
        match self.position {
            SymbolPosition::Before => format!("{} {}", self.symbol, number),
            SymbolPosition::After => format!("{} {}", number, self.symbol),
        }
    }
}

/// Unit in which metal weights are declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Gram,
    Ounce,
}

impl WeightUnit {
    pub fn parse(unit: &str) -> Result<Self, ZakatError> {
        unit.parse::<WeightUnit>()
            .map_err(|_| ZakatError::InvalidWeightUnit(unit.to_string()))
    }
}

/// Thresholds, rates and defaults for a calculation, loaded once per process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZakatConfig {
    pub nisab_gold_grams: Decimal,
    pub nisab_silver_grams: Decimal,
    pub default_gold_price: Decimal,
    pub default_silver_price: Decimal,
    pub cache: CacheSettings,
    pub supported_karats: Vec<u32>,
    pub default_method: Madhab,
    pub irrigated_rate: Decimal,
    pub non_irrigated_rate: Decimal,
    /// Wasq weight in kg per crop, keyed by lowercase crop name.
    pub wasq_weights: BTreeMap<String, Decimal>,
    /// Wasq weight used for crops missing from `wasq_weights`.
    pub default_wasq_kg: Decimal,
    pub precision: u32,
    pub weight_unit: WeightUnit,
    pub currency: CurrencySettings,
}

impl Default for ZakatConfig {
    fn default() -> Self {
        ZakatConfig {
            nisab_gold_grams: dec!(85),
            nisab_silver_grams: dec!(595),
            default_gold_price: dec!(100),
            default_silver_price: dec!(10),
            cache: CacheSettings::default(),
            supported_karats: vec![24, 22, 21, 18, 14, 12, 10],
            default_method: Madhab::Hanafi,
            irrigated_rate: dec!(0.05),
            non_irrigated_rate: dec!(0.1),
            wasq_weights: BTreeMap::new(),
            default_wasq_kg: dec!(60),
            precision: 2,
            weight_unit: WeightUnit::Gram,
            currency: CurrencySettings::default(),
        }
    }
}

impl ZakatConfig {
    /// Reads every recognized key from `repo`, falling back to the defaults
    /// for keys that are absent.
    pub fn load<R: ConfigRepository + ?Sized>(repo: &R) -> Result<Self, ZakatError> {
        let defaults = Self::default();

        let method_label: String = lookup(repo, "calculation_methods.default", defaults.default_method.to_string())?;
        let default_method = Madhab::parse(&method_label)
            .map_err(|e| ZakatError::config("calculation_methods.default", e.to_string()))?;

        let weight_unit_label: String = lookup(repo, "weight_unit", defaults.weight_unit.to_string())?;
        let weight_unit = WeightUnit::parse(&weight_unit_label)?;

        let position_label: String = lookup(repo, "currency.position", defaults.currency.position.to_string())?;
        let position = SymbolPosition::from_str(&position_label)
            .map_err(|_| ZakatError::config("currency.position", format!("expected `before` or `after`, got `{}`", position_label)))?;

        let (wasq_weights, default_wasq_kg) = load_wasq_weights(repo, defaults.default_wasq_kg)?;

        let config = ZakatConfig {
            nisab_gold_grams: lookup_decimal(repo, "nisab.gold", defaults.nisab_gold_grams)?,
            nisab_silver_grams: lookup_decimal(repo, "nisab.silver", defaults.nisab_silver_grams)?,
            default_gold_price: lookup_decimal(repo, "default_prices.gold", defaults.default_gold_price)?,
            default_silver_price: lookup_decimal(repo, "default_prices.silver", defaults.default_silver_price)?,
            cache: CacheSettings {
                enabled: lookup(repo, "cache.enabled", defaults.cache.enabled)?,
                ttl_seconds: lookup(repo, "cache.ttl", defaults.cache.ttl_seconds)?,
            },
            supported_karats: lookup(repo, "supported_karats", defaults.supported_karats)?,
            default_method,
            irrigated_rate: lookup_decimal(repo, "agricultural.irrigated_rate", defaults.irrigated_rate)?,
            non_irrigated_rate: lookup_decimal(repo, "agricultural.non_irrigated_rate", defaults.non_irrigated_rate)?,
            wasq_weights,
            default_wasq_kg,
            precision: lookup(repo, "precision", defaults.precision)?,
            weight_unit,
            currency: CurrencySettings {
                code: lookup(repo, "currency.code", defaults.currency.code)?,
                symbol: lookup(repo, "currency.symbol", defaults.currency.symbol)?,
                position,
            },
        };

        config.validate()?;
        tracing::debug!(
            method = %config.default_method,
            precision = config.precision,
            cache_enabled = config.cache.enabled,
            "Loaded zakat configuration"
        );
        Ok(config)
    }

    /// Validates the configuration for logical consistency.
    pub fn validate(&self) -> Result<(), ZakatError> {
        let non_negative = [
            ("nisab.gold", self.nisab_gold_grams),
            ("nisab.silver", self.nisab_silver_grams),
            ("default_prices.gold", self.default_gold_price),
            ("default_prices.silver", self.default_silver_price),
        ];
        for (key, value) in non_negative {
            if value < Decimal::ZERO {
                return Err(ZakatError::config(key, "must be non-negative"));
            }
        }

        for (key, rate) in [
            ("agricultural.irrigated_rate", self.irrigated_rate),
            ("agricultural.non_irrigated_rate", self.non_irrigated_rate),
        ] {
            if rate < Decimal::ZERO || rate > Decimal::ONE {
                return Err(ZakatError::config(key, "rate must be between 0 and 1"));
            }
        }

        if self.supported_karats.is_empty() {
            return Err(ZakatError::config("supported_karats", "at least one karat is required"));
        }
        if let Some(karat) = self.supported_karats.iter().find(|k| **k == 0 || **k > 24) {
            return Err(ZakatError::config("supported_karats", format!("karat {} is outside 1..=24", karat)));
        }

        if self.default_wasq_kg <= Decimal::ZERO {
            return Err(ZakatError::config("agricultural.wasq_weights.default", "must be positive"));
        }
        if let Some((crop, _)) = self.wasq_weights.iter().find(|(_, kg)| **kg <= Decimal::ZERO) {
            return Err(ZakatError::config(format!("agricultural.wasq_weights.{}", crop), "must be positive"));
        }

        if self.precision > MAX_PRECISION {
            return Err(ZakatError::config("precision", format!("must be at most {}", MAX_PRECISION)));
        }

        Ok(())
    }

    // ========== Fluent Helper Methods ==========

    pub fn with_default_prices(mut self, gold: impl IntoZakatDecimal, silver: impl IntoZakatDecimal) -> Result<Self, ZakatError> {
        self.default_gold_price = gold.into_zakat_decimal()?;
        self.default_silver_price = silver.into_zakat_decimal()?;
        self.validate()?;
        Ok(self)
    }

    pub fn with_nisab_grams(mut self, gold: impl IntoZakatDecimal, silver: impl IntoZakatDecimal) -> Result<Self, ZakatError> {
        self.nisab_gold_grams = gold.into_zakat_decimal()?;
        self.nisab_silver_grams = silver.into_zakat_decimal()?;
        self.validate()?;
        Ok(self)
    }

    pub fn with_wasq_weight(mut self, crop: &str, kg: impl IntoZakatDecimal) -> Result<Self, ZakatError> {
        self.wasq_weights.insert(normalize_crop(crop), kg.into_zakat_decimal()?);
        self.validate()?;
        Ok(self)
    }

    pub fn with_cache(mut self, cache: CacheSettings) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_precision(mut self, precision: u32) -> Result<Self, ZakatError> {
        self.precision = precision;
        self.validate()?;
        Ok(self)
    }

    // Getters

    pub fn supports_karat(&self, karat: u32) -> bool {
        self.supported_karats.contains(&karat)
    }

    /// Wasq weight in kg for `crop`, or the default weight for unlisted crops.
    pub fn wasq_weight(&self, crop: &str) -> Decimal {
        self.wasq_weights
            .get(&normalize_crop(crop))
            .copied()
            .unwrap_or(self.default_wasq_kg)
    }

    pub fn agricultural_rate(&self, is_irrigated: bool) -> Decimal {
        if is_irrigated {
            self.irrigated_rate
        } else {
            self.non_irrigated_rate
        }
    }

    /// Rounds a monetary amount to the configured precision, half away from zero.
    pub fn round(&self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.precision, RoundingStrategy::MidpointAwayFromZero)
    }
}

fn normalize_crop(crop: &str) -> String {
    crop.trim().to_ascii_lowercase()
}

fn lookup<R, T>(repo: &R, key: &str, default: T) -> Result<T, ZakatError>
where
    R: ConfigRepository + ?Sized,
    T: DeserializeOwned,
{
    match repo.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => serde_json::from_value(value).map_err(|e| ZakatError::config(key, e.to_string())),
    }
}

fn lookup_decimal<R>(repo: &R, key: &str, default: Decimal) -> Result<Decimal, ZakatError>
where
    R: ConfigRepository + ?Sized,
{
    match repo.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => value_to_decimal(&value).ok_or_else(|| ZakatError::config(key, format!("expected a number, got {}", value))),
    }
}

fn value_to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else if let Some(u) = n.as_u64() {
                Some(Decimal::from(u))
            } else {
                n.as_f64()?.into_zakat_decimal().ok()
            }
        }
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn load_wasq_weights<R>(repo: &R, fallback: Decimal) -> Result<(BTreeMap<String, Decimal>, Decimal), ZakatError>
where
    R: ConfigRepository + ?Sized,
{
    const KEY: &str = "agricultural.wasq_weights";

    let table = match repo.get(KEY) {
        None | Some(Value::Null) => return Ok((BTreeMap::new(), fallback)),
        Some(Value::Object(table)) => table,
        Some(other) => return Err(ZakatError::config(KEY, format!("expected a table, got {}", other))),
    };

    let mut weights = BTreeMap::new();
    let mut default_kg = fallback;
    for (crop, value) in table {
        let kg = value_to_decimal(&value)
            .ok_or_else(|| ZakatError::config(format!("{}.{}", KEY, crop), "expected a number"))?;
        if crop == "default" {
            default_kg = kg;
        } else {
            weights.insert(normalize_crop(&crop), kg);
        }
    }
    Ok((weights, default_kg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::ConfigStore;
    use serde_json::json;

    #[test]
    fn test_empty_store_gives_defaults() {
        let config = ZakatConfig::load(&ConfigStore::new()).unwrap();
        assert_eq!(config, ZakatConfig::default());
    }

    #[test]
    fn test_bundled_file_matches_defaults() {
        let config = ZakatConfig::load(&ConfigStore::bundled().unwrap()).unwrap();
        assert_eq!(config.nisab_gold_grams, dec!(85));
        assert_eq!(config.nisab_silver_grams, dec!(595));
        assert_eq!(config.default_gold_price, dec!(100));
        assert_eq!(config.irrigated_rate, dec!(0.05));
        assert_eq!(config.non_irrigated_rate, dec!(0.1));
        assert_eq!(config.wasq_weight("wheat"), dec!(60));
        assert!(!config.wasq_weights.contains_key("default"));
    }

    #[test]
    fn test_overrides_are_read() {
        let mut store = ConfigStore::new();
        store
            .set("nisab.gold", 87.48)
            .set("default_prices.silver", "0.85")
            .set("cache.ttl", 60)
            .set("precision", 3)
            .set("calculation_methods.default", "maliki")
            .set("agricultural.wasq_weights.Dates", 65)
            .set("agricultural.wasq_weights.default", 62);

        let config = ZakatConfig::load(&store).unwrap();
        assert_eq!(config.nisab_gold_grams, dec!(87.48));
        assert_eq!(config.default_silver_price, dec!(0.85));
        assert_eq!(config.cache.ttl(), Duration::from_secs(60));
        assert_eq!(config.precision, 3);
        assert_eq!(config.default_method, Madhab::Maliki);
        assert_eq!(config.wasq_weight("dates"), dec!(65));
        assert_eq!(config.wasq_weight("quinoa"), dec!(62));
    }

    #[test]
    fn test_wrong_types_are_configuration_errors() {
        let mut store = ConfigStore::new();
        store.set("cache.enabled", "yes please");
        assert!(matches!(ZakatConfig::load(&store), Err(ZakatError::Configuration { .. })));

        let mut store = ConfigStore::new();
        store.set("nisab.gold", json!([85]));
        let err = ZakatConfig::load(&store).unwrap_err();
        assert!(matches!(err, ZakatError::Configuration { ref key, .. } if key == "nisab.gold"));
    }

    #[test]
    fn test_invalid_weight_unit() {
        let mut store = ConfigStore::new();
        store.set("weight_unit", "tola");
        assert_eq!(
            ZakatConfig::load(&store),
            Err(ZakatError::InvalidWeightUnit("tola".to_string()))
        );
    }

    #[test]
    fn test_invalid_default_method() {
        let mut store = ConfigStore::new();
        store.set("calculation_methods.default", "jafari");
        assert!(matches!(ZakatConfig::load(&store), Err(ZakatError::Configuration { .. })));
    }

    #[test]
    fn test_validation_rules() {
        let mut store = ConfigStore::new();
        store.set("agricultural.irrigated_rate", 1.5);
        assert!(ZakatConfig::load(&store).is_err());

        let mut store = ConfigStore::new();
        store.set("supported_karats", json!([24, 30]));
        assert!(ZakatConfig::load(&store).is_err());

        let mut store = ConfigStore::new();
        store.set("default_prices.gold", -1);
        assert!(ZakatConfig::load(&store).is_err());

        assert!(ZakatConfig::default().with_precision(29).is_err());
    }

    #[test]
    fn test_rounding_is_half_away_from_zero() {
        let config = ZakatConfig::default();
        assert_eq!(config.round(dec!(2.345)), dec!(2.35));
        assert_eq!(config.round(dec!(2.344)), dec!(2.34));
        assert_eq!(config.round(dec!(0.125)), dec!(0.13));
    }

    #[test]
    fn test_currency_format() {
        let currency = CurrencySettings {
            code: "USD".to_string(),
            symbol: "$".to_string(),
            position: SymbolPosition::Before,
        };
        assert_eq!(currency.format(dec!(250), 2), "$ 250.00");

        let after = CurrencySettings { position: SymbolPosition::After, ..currency };
        assert_eq!(after.format(dec!(7.5), 2), "7.50 $");
    }
}
