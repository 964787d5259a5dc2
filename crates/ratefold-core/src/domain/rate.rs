use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CalendarDate, UtcDateTime, ValidationError};

/// Tracked instruments of a [`RateBundle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instrument {
    BcvUsd,
    BcvEur,
    Usdt,
}

impl Instrument {
    pub const ALL: [Self; 3] = [Self::BcvUsd, Self::BcvEur, Self::Usdt];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BcvUsd => "bcv_usd",
            Self::BcvEur => "bcv_eur",
            Self::Usdt => "usdt",
        }
    }
}

impl Display for Instrument {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Instrument {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bcv_usd" | "usd" => Ok(Self::BcvUsd),
            "bcv_eur" | "eur" => Ok(Self::BcvEur),
            "usdt" | "p2p" => Ok(Self::Usdt),
            other => Err(ValidationError::InvalidInstrument {
                value: other.to_owned(),
            }),
        }
    }
}

/// Where a snapshot's `last_update` came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LastUpdate {
    /// Timestamp exactly as the source reported it.
    Reported(String),
    /// Source omitted a date; client clock at request time.
    Fetched(UtcDateTime),
    /// No provider produced this instrument; client's local date.
    Unavailable(CalendarDate),
    /// Value configured by the user rather than fetched.
    UserDefined,
}

impl LastUpdate {
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl Display for LastUpdate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reported(value) => f.write_str(value),
            Self::Fetched(at) => write!(f, "{at}"),
            Self::Unavailable(date) => write!(f, "{date}"),
            Self::UserDefined => f.write_str("user-defined"),
        }
    }
}

/// Canonical point-in-time view of one instrument.
///
/// Every numeric field is always populated; unknown values are zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub price: f64,
    pub previous_price: f64,
    pub percent_change: f64,
    pub absolute_change: f64,
    pub last_update: LastUpdate,
}

impl RateSnapshot {
    /// Zero-filled snapshot dated with the client's fallback date.
    pub fn unavailable(fallback_date: CalendarDate) -> Self {
        Self {
            price: 0.0,
            previous_price: 0.0,
            percent_change: 0.0,
            absolute_change: 0.0,
            last_update: LastUpdate::Unavailable(fallback_date),
        }
    }

    pub fn user_defined(value: f64) -> Self {
        Self {
            price: value,
            previous_price: value,
            percent_change: 0.0,
            absolute_change: 0.0,
            last_update: LastUpdate::UserDefined,
        }
    }
}

/// User-configured rate carried alongside the fetched instruments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomRate {
    pub name: String,
    #[serde(flatten)]
    pub snapshot: RateSnapshot,
}

/// Full set of snapshots produced by one fetch cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateBundle {
    pub bcv_usd: RateSnapshot,
    pub bcv_eur: RateSnapshot,
    pub usdt: RateSnapshot,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom: Vec<CustomRate>,
}

impl RateBundle {
    /// All-zero bundle returned when every provider failed.
    pub fn unavailable(fallback_date: CalendarDate) -> Self {
        Self {
            bcv_usd: RateSnapshot::unavailable(fallback_date),
            bcv_eur: RateSnapshot::unavailable(fallback_date),
            usdt: RateSnapshot::unavailable(fallback_date),
            custom: Vec::new(),
        }
    }

    pub fn get(&self, instrument: Instrument) -> &RateSnapshot {
        match instrument {
            Instrument::BcvUsd => &self.bcv_usd,
            Instrument::BcvEur => &self.bcv_eur,
            Instrument::Usdt => &self.usdt,
        }
    }

    pub fn custom_rate(&self, name: &str) -> Option<&RateSnapshot> {
        self.custom
            .iter()
            .find(|rate| rate.name == name)
            .map(|rate| &rate.snapshot)
    }
}

/// Per-instrument result of normalizing one provider payload.
///
/// Providers only cover some instruments; `None` means "not supplied by this source".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialBundle {
    pub bcv_usd: Option<RateSnapshot>,
    pub bcv_eur: Option<RateSnapshot>,
    pub usdt: Option<RateSnapshot>,
}

impl PartialBundle {
    pub fn is_empty(&self) -> bool {
        self.bcv_usd.is_none() && self.bcv_eur.is_none() && self.usdt.is_none()
    }

    /// Fills instruments still missing here from `other`; existing values are kept.
    pub fn merge(&mut self, other: PartialBundle) {
        if self.bcv_usd.is_none() {
            self.bcv_usd = other.bcv_usd;
        }
        if self.bcv_eur.is_none() {
            self.bcv_eur = other.bcv_eur;
        }
        if self.usdt.is_none() {
            self.usdt = other.usdt;
        }
    }

    pub fn into_bundle(self, fallback_date: CalendarDate) -> RateBundle {
        RateBundle {
            bcv_usd: self
                .bcv_usd
                .unwrap_or_else(|| RateSnapshot::unavailable(fallback_date)),
            bcv_eur: self
                .bcv_eur
                .unwrap_or_else(|| RateSnapshot::unavailable(fallback_date)),
            usdt: self
                .usdt
                .unwrap_or_else(|| RateSnapshot::unavailable(fallback_date)),
            custom: Vec::new(),
        }
    }
}
