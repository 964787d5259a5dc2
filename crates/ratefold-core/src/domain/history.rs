use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{CalendarDate, UtcDateTime, ValidationError};

/// Series tag used by the backend (`nombre`) for each stored rate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum RateName {
    /// Official USD reference rate (`BCV`).
    Bcv,
    /// Official EUR reference rate (`BCV_EUR`).
    BcvEur,
    /// P2P market rate (`USDT`).
    Usdt,
    Other(String),
}

impl RateName {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Bcv => "BCV",
            Self::BcvEur => "BCV_EUR",
            Self::Usdt => "USDT",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for RateName {
    fn from(value: String) -> Self {
        match value.as_str() {
            "BCV" => Self::Bcv,
            "BCV_EUR" => Self::BcvEur,
            "USDT" => Self::Usdt,
            _ => Self::Other(value),
        }
    }
}

impl From<RateName> for String {
    fn from(value: RateName) -> Self {
        value.as_str().to_owned()
    }
}

impl FromStr for RateName {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ValidationError::EmptySetting { field: "name" });
        }
        Ok(Self::from(value.to_ascii_uppercase()))
    }
}

impl Display for RateName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One date bucket of the official history series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub date: CalendarDate,
    pub usd: f64,
    pub eur: f64,
}

impl HistoryRecord {
    pub const fn empty(date: CalendarDate) -> Self {
        Self {
            date,
            usd: 0.0,
            eur: 0.0,
        }
    }
}

/// One point of the P2P-only history view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct P2pPoint {
    pub date: String,
    pub value: f64,
}

/// Result ordering for paginated history queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(ValidationError::InvalidOrder {
                value: other.to_owned(),
            }),
        }
    }
}

/// Filters for the backend's paginated `/api/rates` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub name: Option<RateName>,
    pub limit: usize,
    pub offset: usize,
    pub order: SortOrder,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            name: None,
            limit: 100,
            offset: 0,
            order: SortOrder::Desc,
            from: None,
            to: None,
        }
    }
}

impl HistoryQuery {
    pub fn for_name(name: RateName, limit: usize) -> Result<Self, ValidationError> {
        if limit == 0 {
            return Err(ValidationError::ZeroLimit);
        }
        Ok(Self {
            name: Some(name),
            limit,
            ..Self::default()
        })
    }

    /// Query-string pairs in the order the backend documents them.
    ///
    /// Zero `limit`/`offset` and unset filters are omitted.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(6);
        if let Some(name) = &self.name {
            pairs.push(("nombre", name.as_str().to_owned()));
        }
        if self.limit > 0 {
            pairs.push(("limit", self.limit.to_string()));
        }
        if self.offset > 0 {
            pairs.push(("offset", self.offset.to_string()));
        }
        pairs.push(("order", self.order.as_str().to_owned()));
        if let Some(from) = &self.from {
            pairs.push(("from", from.clone()));
        }
        if let Some(to) = &self.to {
            pairs.push(("to", to.clone()));
        }
        pairs
    }
}

/// Normalized row of the paginated history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Option<Value>,
    pub name: RateName,
    pub value: f64,
    pub previous_value: f64,
    pub percent_change: f64,
    pub absolute_change: f64,
    pub date: String,
    /// Epoch milliseconds of `date`, when it parses.
    pub timestamp: Option<i64>,
}

/// Page of normalized history plus the backend's pagination/filter echo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    pub records: Vec<HistoryEntry>,
    pub pagination: Option<Value>,
    pub filters: Option<Value>,
}

impl HistoryPage {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The USDT-only view: one point per USDT row, in page order.
    pub fn p2p_series(&self) -> Vec<P2pPoint> {
        self.records
            .iter()
            .filter(|entry| entry.name == RateName::Usdt)
            .map(|entry| P2pPoint {
                date: entry.date.clone(),
                value: entry.value,
            })
            .collect()
    }
}

/// Keeps points whose timestamp falls within `[from, to]`; unset bounds are open.
///
/// Points with unparseable dates are kept only when both bounds are unset.
pub fn filter_range(
    points: &[P2pPoint],
    from: Option<UtcDateTime>,
    to: Option<UtcDateTime>,
) -> Vec<P2pPoint> {
    if from.is_none() && to.is_none() {
        return points.to_vec();
    }

    points
        .iter()
        .filter(|point| {
            let Some(at) = UtcDateTime::parse_lenient(&point.date) else {
                return false;
            };
            from.map_or(true, |from| at >= from) && to.map_or(true, |to| at <= to)
        })
        .cloned()
        .collect()
}
