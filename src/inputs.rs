use rust_decimal::Decimal;
use std::str::FromStr;
use crate::types::ZakatError;

/// Conversion into the `Decimal` used for every amount, weight and price.
///
/// Lets callers pass `i32`, `f64`, `&str` and so on straight into setters
/// without wrapping them in `dec!()` or `Decimal::from()`.
pub trait IntoZakatDecimal {
    fn into_zakat_decimal(self) -> Result<Decimal, ZakatError>;
}

impl IntoZakatDecimal for Decimal {
    fn into_zakat_decimal(self) -> Result<Decimal, ZakatError> {
        Ok(self)
    }
}

macro_rules! impl_into_zakat_decimal_int {
    ($($t:ty),*) => {
        $(
            impl IntoZakatDecimal for $t {
                fn into_zakat_decimal(self) -> Result<Decimal, ZakatError> {
                    Ok(Decimal::from(self))
                }
            }
        )*
    };
}

impl_into_zakat_decimal_int!(i32, u32, i64, u64, isize, usize);

// Floats go through their shortest round-trip text form so that 0.05 becomes
// exactly 0.05 rather than the nearest binary fraction.
macro_rules! impl_into_zakat_decimal_float {
    ($($t:ty),*) => {
        $(
            impl IntoZakatDecimal for $t {
                fn into_zakat_decimal(self) -> Result<Decimal, ZakatError> {
                    if !self.is_finite() {
                        return Err(ZakatError::InvalidNumber(self.to_string()));
                    }
                    Decimal::from_str(&self.to_string())
                        .map_err(|_| ZakatError::InvalidNumber(self.to_string()))
                }
            }
        )*
    };
}

impl_into_zakat_decimal_float!(f32, f64);

impl IntoZakatDecimal for &str {
    fn into_zakat_decimal(self) -> Result<Decimal, ZakatError> {
        Decimal::from_str(self.trim()).map_err(|_| ZakatError::InvalidNumber(self.to_string()))
    }
}

impl IntoZakatDecimal for String {
    fn into_zakat_decimal(self) -> Result<Decimal, ZakatError> {
        self.as_str().into_zakat_decimal()
    }
}

/// Converts `value` and rejects anything below zero, naming `field` in the error.
pub(crate) fn non_negative(value: impl IntoZakatDecimal, field: &str) -> Result<Decimal, ZakatError> {
    let value = value.into_zakat_decimal()?;
    if value < Decimal::ZERO {
        return Err(ZakatError::negative(field));
    }
    Ok(value)
}
