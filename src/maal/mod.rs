//! Per-category Zakat rules.
//!
//! Each category is valued, compared against its own threshold and levied
//! independently. The functions here receive already-validated declarations
//! and return details rounded to the configured precision.

pub mod agriculture;
pub mod business;
pub mod cash;
pub mod precious_metals;

use rust_decimal::Decimal;

use crate::types::ZakatError;

/// Applies `rate` to `value` when it reaches `threshold`.
///
/// A zero value is never payable, even against a zero threshold.
pub(crate) fn levy(value: Decimal, threshold: Decimal, rate: Decimal, what: &str) -> Result<(bool, Decimal), ZakatError> {
    let is_payable = value >= threshold && value > Decimal::ZERO;
    if !is_payable {
        return Ok((false, Decimal::ZERO));
    }
    let due = value
        .checked_mul(rate)
        .ok_or_else(|| ZakatError::overflow(format!("{} zakat", what)))?;
    Ok((true, due))
}

pub(crate) fn checked_sum<I>(values: I, what: &str) -> Result<Decimal, ZakatError>
where
    I: IntoIterator<Item = Decimal>,
{
    values.into_iter().try_fold(Decimal::ZERO, |acc, value| {
        acc.checked_add(value).ok_or_else(|| ZakatError::overflow(what.to_string()))
    })
}
