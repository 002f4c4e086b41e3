use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::inputs::IntoZakatDecimal;
use crate::maal::checked_sum;
use crate::pricing::NisabService;
use crate::types::ZakatError;

/// A harvest of one crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgriculturalProduct {
    pub weight_kg: Decimal,
    /// Artificially irrigated crops are levied at the lower rate.
    pub is_irrigated: bool,
}

impl AgriculturalProduct {
    pub fn new(weight_kg: impl IntoZakatDecimal, is_irrigated: bool) -> Result<Self, ZakatError> {
        Ok(Self {
            weight_kg: weight_kg.into_zakat_decimal()?,
            is_irrigated,
        })
    }

    pub fn irrigated(weight_kg: impl IntoZakatDecimal) -> Result<Self, ZakatError> {
        Self::new(weight_kg, true)
    }

    pub fn rain_fed(weight_kg: impl IntoZakatDecimal) -> Result<Self, ZakatError> {
        Self::new(weight_kg, false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetails {
    pub weight_kg: Decimal,
    pub is_irrigated: bool,
    /// Five wasqs of this crop, in kg.
    pub nisab_weight_kg: Decimal,
    pub rate: Decimal,
    pub is_payable: bool,
    pub zakat: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgriculturalDetails {
    pub products: BTreeMap<String, ProductDetails>,
    pub zakat: Decimal,
}

/// Each product is checked against its own crop threshold by weight and
/// levied at the irrigation-dependent rate on its full weight.
pub fn calculate_agriculture(
    products: &BTreeMap<String, AgriculturalProduct>,
    nisab: &NisabService,
) -> Result<AgriculturalDetails, ZakatError> {
    let config = nisab.config();
    let mut details = BTreeMap::new();

    for (crop, product) in products {
        let threshold = nisab.agricultural_nisab_threshold(crop);
        let rate = nisab.agricultural_zakat_rate(product.is_irrigated);
        let is_payable = nisab.check_agricultural_nisab(crop, product.weight_kg) && product.weight_kg > Decimal::ZERO;
        let zakat = if is_payable {
            product
                .weight_kg
                .checked_mul(rate)
                .ok_or_else(|| ZakatError::overflow(format!("agricultural zakat for {}", crop)))?
        } else {
            Decimal::ZERO
        };

        tracing::trace!(%crop, weight = %product.weight_kg, %threshold, is_payable, "Checked agricultural nisab");
        details.insert(
            crop.clone(),
            ProductDetails {
                weight_kg: product.weight_kg,
                is_irrigated: product.is_irrigated,
                nisab_weight_kg: threshold,
                rate,
                is_payable,
                zakat: config.round(zakat),
            },
        );
    }

    let zakat = checked_sum(details.values().map(|d| d.zakat), "agricultural zakat")?;
    Ok(AgriculturalDetails { products: details, zakat })
}
