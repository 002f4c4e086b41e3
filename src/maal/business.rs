use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::ZAKAT_RATE;
use crate::maal::{checked_sum, levy};
use crate::pricing::NisabService;
use crate::types::ZakatError;

/// Business holdings (inventory, receivables, cash at bank, ...) and their levy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessDetails {
    pub assets: BTreeMap<String, Decimal>,
    pub total: Decimal,
    pub nisab_threshold: Decimal,
    pub is_payable: bool,
    pub zakat: Decimal,
}

/// All business assets are summed and measured together against the gold nisab value.
pub fn calculate_business(assets: &BTreeMap<String, Decimal>, nisab: &NisabService) -> Result<BusinessDetails, ZakatError> {
    let config = nisab.config();
    let total = checked_sum(assets.values().copied(), "business assets total")?;
    let threshold = nisab.gold_nisab_value()?;
    let (is_payable, zakat) = levy(total, threshold, ZAKAT_RATE, "business")?;

    Ok(BusinessDetails {
        assets: assets.iter().map(|(label, amount)| (label.clone(), config.round(*amount))).collect(),
        total: config.round(total),
        nisab_threshold: config.round(threshold),
        is_payable,
        zakat: config.round(zakat),
    })
}
