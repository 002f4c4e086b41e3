//! The calculation engine.
//!
//! `ZakatCalculator` holds one caller's declarations. Every setter validates
//! before it touches state, so a rejected value leaves the previous
//! declaration in place. `calculate` reads prices and thresholds from the
//! owned `NisabService` and never mutates the declarations.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::PriceCache;
use crate::config::ZakatConfig;
use crate::inputs::{non_negative, IntoZakatDecimal};
use crate::madhab::Madhab;
use crate::maal::agriculture::{calculate_agriculture, AgriculturalProduct};
use crate::maal::business::calculate_business;
use crate::maal::cash::calculate_cash;
use crate::maal::checked_sum;
use crate::maal::precious_metals::{calculate_gold, calculate_silver, GoldItem};
use crate::pricing::NisabService;
use crate::report::{ZakatBreakdown, ZakatReport};
use crate::types::{WealthType, ZakatError};

#[derive(Debug)]
pub struct ZakatCalculator {
    nisab: NisabService,
    cash: Decimal,
    gold_items: Vec<GoldItem>,
    silver_weight: Decimal,
    business_assets: BTreeMap<String, Decimal>,
    agricultural_products: BTreeMap<String, AgriculturalProduct>,
    calculation_method: Madhab,
}

impl ZakatCalculator {
    /// Creates an empty declaration using the configured default method.
    pub fn new(nisab: NisabService) -> Self {
        let calculation_method = nisab.config().default_method;
        Self {
            nisab,
            cash: Decimal::ZERO,
            gold_items: Vec::new(),
            silver_weight: Decimal::ZERO,
            business_assets: BTreeMap::new(),
            agricultural_products: BTreeMap::new(),
            calculation_method,
        }
    }

    pub fn from_config(config: impl Into<Arc<ZakatConfig>>, cache: Arc<dyn PriceCache + Send + Sync>) -> Self {
        Self::new(NisabService::new(config, cache))
    }

    pub fn nisab_service(&self) -> &NisabService {
        &self.nisab
    }

    pub fn nisab_service_mut(&mut self) -> &mut NisabService {
        &mut self.nisab
    }

    // ========== Declarations ==========

    pub fn set_cash(&mut self, amount: impl IntoZakatDecimal) -> Result<&mut Self, ZakatError> {
        self.cash = non_negative(amount, "cash")?;
        Ok(self)
    }

    pub fn add_gold_item(&mut self, karat: u32, weight_grams: impl IntoZakatDecimal) -> Result<&mut Self, ZakatError> {
        let item = GoldItem::new(karat, weight_grams)?;
        self.validate_gold_item(&item)?;
        self.gold_items.push(item);
        Ok(self)
    }

    /// Replaces the gold list. Nothing is replaced unless every item is valid.
    pub fn set_gold_items<I>(&mut self, items: I) -> Result<&mut Self, ZakatError>
    where
        I: IntoIterator<Item = GoldItem>,
    {
        let items: Vec<GoldItem> = items.into_iter().collect();
        for item in &items {
            self.validate_gold_item(item)?;
        }
        self.gold_items = items;
        Ok(self)
    }

    fn validate_gold_item(&self, item: &GoldItem) -> Result<(), ZakatError> {
        if item.weight_grams < Decimal::ZERO {
            return Err(ZakatError::negative("gold weight"));
        }
        if !self.nisab.config().supports_karat(item.karat) {
            return Err(ZakatError::InvalidKarat(item.karat));
        }
        Ok(())
    }

    pub fn set_silver_weight(&mut self, weight_grams: impl IntoZakatDecimal) -> Result<&mut Self, ZakatError> {
        self.silver_weight = non_negative(weight_grams, "silver weight")?;
        Ok(self)
    }

    /// Replaces all business assets with `assets` (label → amount).
    pub fn set_business_assets<I, K, V>(&mut self, assets: I) -> Result<&mut Self, ZakatError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: IntoZakatDecimal,
    {
        let mut validated = BTreeMap::new();
        for (label, amount) in assets {
            let label = label.into();
            let amount = non_negative(amount, &format!("business asset `{}`", label))?;
            validated.insert(label, amount);
        }
        self.business_assets = validated;
        Ok(self)
    }

    /// Adds or replaces a single business asset.
    pub fn add_business_asset(&mut self, label: impl Into<String>, amount: impl IntoZakatDecimal) -> Result<&mut Self, ZakatError> {
        let label = label.into();
        let amount = non_negative(amount, &format!("business asset `{}`", label))?;
        self.business_assets.insert(label, amount);
        Ok(self)
    }

    pub fn set_agricultural_products<I, K>(&mut self, products: I) -> Result<&mut Self, ZakatError>
    where
        I: IntoIterator<Item = (K, AgriculturalProduct)>,
        K: Into<String>,
    {
        let mut validated = BTreeMap::new();
        for (crop, product) in products {
            let crop = crop.into();
            if product.weight_kg < Decimal::ZERO {
                return Err(ZakatError::negative(format!("{} weight", crop)));
            }
            validated.insert(crop, product);
        }
        self.agricultural_products = validated;
        Ok(self)
    }

    pub fn add_agricultural_product(
        &mut self,
        crop: impl Into<String>,
        weight_kg: impl IntoZakatDecimal,
        is_irrigated: bool,
    ) -> Result<&mut Self, ZakatError> {
        let crop = crop.into();
        let weight_kg = non_negative(weight_kg, &format!("{} weight", crop))?;
        self.agricultural_products
            .insert(crop, AgriculturalProduct { weight_kg, is_irrigated });
        Ok(self)
    }

    /// Sets the school label by name (`hanafi`, `shafi`, `maliki`, `hanbali`).
    pub fn set_calculation_method(&mut self, method: &str) -> Result<&mut Self, ZakatError> {
        self.calculation_method = Madhab::parse(method)?;
        Ok(self)
    }

    pub fn set_madhab(&mut self, madhab: Madhab) -> &mut Self {
        self.calculation_method = madhab;
        self
    }

    pub fn set_gold_price(&mut self, price: impl IntoZakatDecimal) -> Result<&mut Self, ZakatError> {
        self.nisab.set_gold_price(price)?;
        Ok(self)
    }

    pub fn set_silver_price(&mut self, price: impl IntoZakatDecimal) -> Result<&mut Self, ZakatError> {
        self.nisab.set_silver_price(price)?;
        Ok(self)
    }

    // Getters

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    pub fn gold_items(&self) -> &[GoldItem] {
        &self.gold_items
    }

    pub fn silver_weight(&self) -> Decimal {
        self.silver_weight
    }

    pub fn business_assets(&self) -> &BTreeMap<String, Decimal> {
        &self.business_assets
    }

    pub fn agricultural_products(&self) -> &BTreeMap<String, AgriculturalProduct> {
        &self.agricultural_products
    }

    pub fn calculation_method(&self) -> Madhab {
        self.calculation_method
    }

    // ========== Calculation ==========

    /// Computes every declared category and the total. Categories whose
    /// declared amounts or weights are all zero are left out of the breakdown.
    ///
    /// Only decimal overflow can fail here; declarations were validated when set.
    pub fn calculate(&self) -> Result<ZakatReport, ZakatError> {
        let config = self.nisab.config();
        let prices = self.nisab.prices();

        if prices.gold_per_gram.is_zero() {
            warn!("Gold price is zero; cash, gold and business thresholds collapse to zero");
        }
        if prices.silver_per_gram.is_zero() {
            warn!("Silver price is zero; silver threshold collapses to zero");
        }

        let mut details = ZakatBreakdown::default();
        if self.cash > Decimal::ZERO {
            details.cash = Some(calculate_cash(self.cash, &self.nisab)?);
        }
        if self.gold_items.iter().any(|item| item.weight_grams > Decimal::ZERO) {
            details.gold = Some(calculate_gold(&self.gold_items, &self.nisab)?);
        }
        if self.silver_weight > Decimal::ZERO {
            details.silver = Some(calculate_silver(self.silver_weight, &self.nisab)?);
        }
        if self.business_assets.values().any(|amount| *amount > Decimal::ZERO) {
            details.business = Some(calculate_business(&self.business_assets, &self.nisab)?);
        }
        if self.agricultural_products.values().any(|product| product.weight_kg > Decimal::ZERO) {
            details.agricultural = Some(calculate_agriculture(&self.agricultural_products, &self.nisab)?);
        }

        let total = checked_sum(
            WealthType::ALL.into_iter().filter_map(|t| details.zakat_for(t)),
            "total zakat",
        )?;
        let total_zakat = config.round(total);

        debug!(
            method = %self.calculation_method,
            categories = details.categories().len(),
            %total_zakat,
            "Calculated zakat"
        );

        Ok(ZakatReport {
            total_zakat,
            calculation_method: self.calculation_method,
            details,
            prices,
            currency: config.currency.clone(),
            precision: config.precision,
        })
    }
}
