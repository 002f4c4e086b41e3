//! Zakat calculation for cash, gold, silver, business and agricultural assets.
//!
//! A [`NisabService`] owns the current metal prices and every threshold
//! derived from [`ZakatConfig`]; a [`ZakatCalculator`] holds one caller's
//! declarations and produces a [`ZakatReport`].
//!
//! ```rust
//! use std::sync::Arc;
//! use zakat_calculator::prelude::*;
//!
//! let mut calculator = ZakatCalculator::from_config(ZakatConfig::default(), Arc::new(MemoryCache::new()));
//! calculator.set_cash(10_000)?.add_gold_item(24, 100)?;
//!
//! let report = calculator.calculate()?;
//! assert_eq!(report.total_zakat, rust_decimal::Decimal::from(500));
//! # Ok::<(), ZakatError>(())
//! ```

pub mod cache;
pub mod calculator;
pub mod config;
pub mod inputs;
pub mod maal;
pub mod madhab;
pub mod prelude;
pub mod pricing;
pub mod report;
pub mod repository;
pub mod types;

pub use cache::{MemoryCache, PriceCache};
pub use calculator::ZakatCalculator;
pub use config::ZakatConfig;
pub use inputs::IntoZakatDecimal;
pub use madhab::Madhab;
pub use pricing::{NisabService, PriceSource};
pub use report::{ZakatBreakdown, ZakatReport};
pub use repository::{ConfigRepository, ConfigStore};
pub use types::{WealthType, ZakatError};
