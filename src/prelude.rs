//! Prelude module for zakat-calculator
//!
//! Re-exports the types needed for a typical calculation.
//!
//! # Usage
//!
//! ```rust
//! use zakat_calculator::prelude::*;
//! ```

// Core exports
pub use crate::cache::{MemoryCache, PriceCache};
pub use crate::calculator::ZakatCalculator;
pub use crate::config::{CacheSettings, CurrencySettings, SymbolPosition, WeightUnit, ZakatConfig, ZAKAT_RATE};
pub use crate::inputs::IntoZakatDecimal;
pub use crate::madhab::Madhab;
pub use crate::report::{ZakatBreakdown, ZakatReport};
pub use crate::repository::{ConfigRepository, ConfigStore};
pub use crate::types::{WealthType, ZakatError};

// Pricing
#[cfg(feature = "async")]
pub use crate::pricing::PriceProvider;
pub use crate::pricing::{NisabService, PriceSnapshot, PriceSource, Prices, StaticPriceProvider};

// Per-category details
pub use crate::maal::agriculture::{AgriculturalDetails, AgriculturalProduct, ProductDetails};
pub use crate::maal::business::BusinessDetails;
pub use crate::maal::cash::CashDetails;
pub use crate::maal::precious_metals::{GoldDetails, GoldItem, SilverDetails};
