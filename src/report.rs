//! The result of a calculation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::config::CurrencySettings;
use crate::madhab::Madhab;
use crate::maal::agriculture::AgriculturalDetails;
use crate::maal::business::BusinessDetails;
use crate::maal::cash::CashDetails;
use crate::maal::precious_metals::{GoldDetails, SilverDetails};
use crate::pricing::PriceSnapshot;
use crate::types::WealthType;

/// Per-category results. A category is present only when something was declared for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZakatBreakdown {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cash: Option<CashDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gold: Option<GoldDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silver: Option<SilverDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business: Option<BusinessDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agricultural: Option<AgriculturalDetails>,
}

impl ZakatBreakdown {
    pub fn is_empty(&self) -> bool {
        self.categories().is_empty()
    }

    /// Levy for one category, `None` when the category was not declared.
    pub fn zakat_for(&self, wealth_type: WealthType) -> Option<Decimal> {
        match wealth_type {
            WealthType::Cash => self.cash.as_ref().map(|d| d.zakat),
            WealthType::Gold => self.gold.as_ref().map(|d| d.zakat),
            WealthType::Silver => self.silver.as_ref().map(|d| d.zakat),
            WealthType::Business => self.business.as_ref().map(|d| d.zakat),
            WealthType::Agricultural => self.agricultural.as_ref().map(|d| d.zakat),
        }
    }

    /// Declared categories, in a fixed order.
    pub fn categories(&self) -> Vec<WealthType> {
        WealthType::ALL
            .into_iter()
            .filter(|t| self.zakat_for(*t).is_some())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZakatReport {
    pub total_zakat: Decimal,
    pub calculation_method: Madhab,
    pub details: ZakatBreakdown,
    pub prices: PriceSnapshot,
    pub currency: CurrencySettings,
    pub precision: u32,
}

impl ZakatReport {
    pub fn is_payable(&self) -> bool {
        self.total_zakat > Decimal::ZERO
    }

    /// Returns the total formatted with the configured currency symbol.
    pub fn format_amount(&self) -> String {
        self.currency.format(self.total_zakat, self.precision)
    }

    /// One line per declared category plus the total.
    pub fn summary(&self) -> String {
        let mut output = String::new();
        for category in self.details.categories() {
            let due = self.details.zakat_for(category).unwrap_or(Decimal::ZERO);
            let status = if due > Decimal::ZERO { "Payable" } else { "Exempt" };
            let _ = writeln!(output, "{}: {} - Due: {}", category, status, self.currency.format(due, self.precision));
        }
        let _ = write!(output, "Total ({}): {}", self.calculation_method, self.format_amount());
        output
    }
}

impl std::fmt::Display for ZakatReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let money = |amount: Decimal| self.currency.format(amount, self.precision);

        writeln!(f, "Zakat Report ({}, {})", self.calculation_method, self.currency.code)?;
        writeln!(
            f,
            "Prices: gold {}/g, silver {}/g",
            money(self.prices.gold_per_gram),
            money(self.prices.silver_per_gram)
        )?;

        if let Some(cash) = &self.details.cash {
            writeln!(f, "Cash: {} | Nisab: {} | Due: {}", money(cash.amount), money(cash.nisab_threshold), money(cash.zakat))?;
        }
        if let Some(gold) = &self.details.gold {
            writeln!(
                f,
                "Gold: {}g ({} items) = {} | Nisab: {} | Due: {}",
                gold.total_weight_grams,
                gold.items.len(),
                money(gold.value),
                money(gold.nisab_threshold),
                money(gold.zakat)
            )?;
        }
        if let Some(silver) = &self.details.silver {
            writeln!(
                f,
                "Silver: {}g = {} | Nisab: {} | Due: {}",
                silver.weight_grams,
                money(silver.value),
                money(silver.nisab_threshold),
                money(silver.zakat)
            )?;
        }
        if let Some(business) = &self.details.business {
            writeln!(
                f,
                "Business: {} | Nisab: {} | Due: {}",
                money(business.total),
                money(business.nisab_threshold),
                money(business.zakat)
            )?;
        }
        if let Some(agri) = &self.details.agricultural {
            for (crop, product) in &agri.products {
                let status = if product.is_payable { "PAYABLE" } else { "EXEMPT" };
                writeln!(
                    f,
                    "Agricultural {}: {}kg (nisab {}kg) {} | Due: {}",
                    crop,
                    product.weight_kg,
                    product.nisab_weight_kg,
                    status,
                    money(product.zakat)
                )?;
            }
        }

        let status = if self.is_payable() { "PAYABLE" } else { "EXEMPT" };
        write!(f, "Total: {} ({})", self.format_amount(), status)
    }
}
