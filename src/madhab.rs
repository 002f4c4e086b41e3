use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::types::ZakatError;

/// Islamic school of thought (Madhab) recorded against a calculation.
///
/// The label is carried through to the report; it does not change any
/// threshold or rate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
    EnumString, Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Madhab {
    #[default]
    Hanafi,
    Shafi,
    Maliki,
    Hanbali,
}

impl Madhab {
    /// Parses a method label, mapping unknown labels to `InvalidCalculationMethod`.
    pub fn parse(method: &str) -> Result<Self, ZakatError> {
        method
            .parse::<Madhab>()
            .map_err(|_| ZakatError::InvalidCalculationMethod(method.to_string()))
    }
}
