use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Direction of a conversion against a rate quoted in bolívares per unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionMode {
    #[default]
    UsdToBs,
    BsToUsd,
}

impl ConversionMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UsdToBs => "usd_to_bs",
            Self::BsToUsd => "bs_to_usd",
        }
    }
}

impl Display for ConversionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversionMode {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "usd_to_bs" => Ok(Self::UsdToBs),
            "bs_to_usd" => Ok(Self::BsToUsd),
            other => Err(ValidationError::InvalidConversionMode {
                value: other.to_owned(),
            }),
        }
    }
}

/// Converts `amount` at `price`.
///
/// A non-positive amount means "no amount entered" and yields the price itself.
/// Dividing by a zero price yields 0.
pub fn convert(amount: f64, price: f64, mode: ConversionMode) -> f64 {
    if amount <= 0.0 || amount.is_nan() {
        return price;
    }
    match mode {
        ConversionMode::UsdToBs => price * amount,
        ConversionMode::BsToUsd if price > 0.0 => amount / price,
        ConversionMode::BsToUsd => 0.0,
    }
}
