//! Walks a household through a full declaration and prints the report.

use std::sync::Arc;
use zakat_calculator::prelude::*;

fn main() -> Result<(), ZakatError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let store = ConfigStore::bundled()?.with_env_overrides();
    let config = ZakatConfig::load(&store)?;
    let cache = Arc::new(MemoryCache::new());

    let mut calculator = ZakatCalculator::from_config(config, cache);
    calculator
        .set_gold_price(50)?
        .set_silver_price(0.5)?
        .set_cash(10_000)?
        .add_gold_item(24, 100)?
        .add_gold_item(21, "12.5")?
        .set_silver_weight(600)?
        .add_business_asset("inventory", 15_000)?
        .add_business_asset("receivables", 2_500)?
        .add_agricultural_product("wheat", 400, true)?
        .add_agricultural_product("dates", 250, false)?
        .set_calculation_method("shafi")?;

    let report = calculator.calculate()?;
    println!("{}", report);
    println!();
    println!("{}", report.summary());

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("\n{}", json),
        Err(e) => eprintln!("Failed to serialize report: {}", e),
    }

    Ok(())
}
