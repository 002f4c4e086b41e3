use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the calculator, the nisab service and the configuration layer.
///
/// The first five variants are caller-input failures and are always raised
/// synchronously by the setter that received the bad value. The remaining
/// variants come from the collaborators (configuration, cache) or from checked
/// decimal arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ZakatError {
    /// A monetary amount, weight or price was below zero.
    #[error("{0} cannot be negative")]
    NegativeValue(String),

    /// A gold item carried a karat outside the configured supported set.
    #[error("Unsupported gold karat: {0}")]
    InvalidKarat(u32),

    /// The configured weight unit is neither `gram` nor `ounce`.
    #[error("Invalid weight unit: {0}. Supported units are: gram, ounce")]
    InvalidWeightUnit(String),

    /// The calculation method is not one of the four schools.
    #[error("Unsupported calculation method: {0}")]
    InvalidCalculationMethod(String),

    /// A value could not be represented as a finite decimal.
    #[error("Invalid numeric value: {0}")]
    InvalidNumber(String),

    #[error("Configuration error for `{key}`: {reason}")]
    Configuration { key: String, reason: String },

    #[error("Price cache failure: {0}")]
    Cache(String),

    #[error("Arithmetic overflow while computing {0}")]
    Overflow(String),
}

impl ZakatError {
    pub fn negative(field: impl Into<String>) -> Self {
        ZakatError::NegativeValue(field.into())
    }

    pub fn config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ZakatError::Configuration {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn overflow(operation: impl Into<String>) -> Self {
        ZakatError::Overflow(operation.into())
    }

    /// True for errors caused by a value the caller supplied.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            ZakatError::NegativeValue(_)
                | ZakatError::InvalidKarat(_)
                | ZakatError::InvalidWeightUnit(_)
                | ZakatError::InvalidCalculationMethod(_)
                | ZakatError::InvalidNumber(_)
        )
    }
}

/// The five asset categories a declaration is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WealthType {
    Cash,
    Gold,
    Silver,
    Business,
    Agricultural,
}

impl WealthType {
    pub const ALL: [WealthType; 5] = [
        WealthType::Cash,
        WealthType::Gold,
        WealthType::Silver,
        WealthType::Business,
        WealthType::Agricultural,
    ];
}

impl std::fmt::Display for WealthType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WealthType::Cash => "cash",
            WealthType::Gold => "gold",
            WealthType::Silver => "silver",
            WealthType::Business => "business",
            WealthType::Agricultural => "agricultural",
        };
        f.write_str(name)
    }
}
