use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::ZAKAT_RATE;
use crate::maal::levy;
use crate::pricing::NisabService;
use crate::types::ZakatError;

/// Cash holdings and the levy due on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashDetails {
    pub amount: Decimal,
    pub nisab_threshold: Decimal,
    pub is_payable: bool,
    pub zakat: Decimal,
}

/// Cash is measured against the gold nisab value.
pub fn calculate_cash(amount: Decimal, nisab: &NisabService) -> Result<CashDetails, ZakatError> {
    let config = nisab.config();
    let threshold = nisab.gold_nisab_value()?;
    let (is_payable, zakat) = levy(amount, threshold, ZAKAT_RATE, "cash")?;

    Ok(CashDetails {
        amount: config.round(amount),
        nisab_threshold: config.round(threshold),
        is_payable,
        zakat: config.round(zakat),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::config::ZakatConfig;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn nisab(gold: Decimal) -> NisabService {
        let mut service = NisabService::new(ZakatConfig::default(), Arc::new(MemoryCache::new()));
        service.set_gold_price(gold).unwrap();
        service
    }

    #[test]
    fn test_cash_above_nisab() {
        // Nisab = 85 * 100 = 8500
        let details = calculate_cash(dec!(10000), &nisab(dec!(100))).unwrap();
        assert!(details.is_payable);
        assert_eq!(details.nisab_threshold, dec!(8500));
        assert_eq!(details.zakat, dec!(250));
    }

    #[test]
    fn test_cash_below_nisab() {
        let details = calculate_cash(dec!(8000), &nisab(dec!(100))).unwrap();
        assert!(!details.is_payable);
        assert_eq!(details.zakat, Decimal::ZERO);
    }

    #[test]
    fn test_cash_levy_is_rounded() {
        // 4250.3 * 0.025 = 106.2575
        let details = calculate_cash(dec!(4250.3), &nisab(dec!(50))).unwrap();
        assert_eq!(details.zakat, dec!(106.26));
    }
}
