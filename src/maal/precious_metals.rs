use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::ZAKAT_RATE;
use crate::inputs::IntoZakatDecimal;
use crate::maal::{checked_sum, levy};
use crate::pricing::NisabService;
use crate::types::ZakatError;

/// A declared piece of gold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldItem {
    /// Purity out of 24.
    pub karat: u32,
    pub weight_grams: Decimal,
}

impl GoldItem {
    pub fn new(karat: u32, weight_grams: impl IntoZakatDecimal) -> Result<Self, ZakatError> {
        Ok(Self {
            karat,
            weight_grams: weight_grams.into_zakat_decimal()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldDetails {
    pub items: Vec<GoldItem>,
    pub total_weight_grams: Decimal,
    pub price_per_gram: Decimal,
    pub value: Decimal,
    pub nisab_threshold: Decimal,
    pub is_payable: bool,
    pub zakat: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SilverDetails {
    pub weight_grams: Decimal,
    pub price_per_gram: Decimal,
    pub value: Decimal,
    pub nisab_threshold: Decimal,
    pub is_payable: bool,
    pub zakat: Decimal,
}

/// Gold is valued at its full declared weight × the gold price; the karat is
/// validated and echoed but does not scale the weight.
pub fn calculate_gold(items: &[GoldItem], nisab: &NisabService) -> Result<GoldDetails, ZakatError> {
    let config = nisab.config();
    let price = nisab.gold_price();

    let total_weight = checked_sum(items.iter().map(|item| item.weight_grams), "gold weight")?;
    let value = checked_sum(
        items
            .iter()
            .map(|item| item.weight_grams.checked_mul(price))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| ZakatError::overflow("gold value"))?,
        "gold value",
    )?;
    let threshold = nisab.gold_nisab_value()?;
    let (is_payable, zakat) = levy(value, threshold, ZAKAT_RATE, "gold")?;

    Ok(GoldDetails {
        items: items.to_vec(),
        total_weight_grams: total_weight,
        price_per_gram: price,
        value: config.round(value),
        nisab_threshold: config.round(threshold),
        is_payable,
        zakat: config.round(zakat),
    })
}

pub fn calculate_silver(weight_grams: Decimal, nisab: &NisabService) -> Result<SilverDetails, ZakatError> {
    let config = nisab.config();
    let price = nisab.silver_price();

    let value = weight_grams
        .checked_mul(price)
        .ok_or_else(|| ZakatError::overflow("silver value"))?;
    let threshold = nisab.silver_nisab_value()?;
    let (is_payable, zakat) = levy(value, threshold, ZAKAT_RATE, "silver")?;

    Ok(SilverDetails {
        weight_grams,
        price_per_gram: price,
        value: config.round(value),
        nisab_threshold: config.round(threshold),
        is_payable,
        zakat: config.round(zakat),
    })
}
