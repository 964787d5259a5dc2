use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::ValidationError;

const NAIVE_DATE_TIME: &[FormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute][optional [:[second][optional [.[subsecond]]]]]"
);
const NAIVE_DATE_TIME_SPACED: &[FormatItem<'static>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute][optional [:[second][optional [.[subsecond]]]]]"
);
const CALENDAR_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");
const SLASHED_DATE: &[FormatItem<'static>] = format_description!("[day]/[month]/[year]");

/// RFC3339 timestamp guaranteed to be UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcDateTime(OffsetDateTime);

impl UtcDateTime {
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let parsed = OffsetDateTime::parse(input, &Rfc3339).map_err(|_| {
            ValidationError::TimestampNotUtc {
                value: input.to_owned(),
            }
        })?;

        Self::from_offset_datetime(parsed).map_err(|_| ValidationError::TimestampNotUtc {
            value: input.to_owned(),
        })
    }

    /// Parses the timestamp shapes rate sources emit.
    ///
    /// Offsets are converted to UTC; naive `YYYY-MM-DDTHH:MM[:SS[.fff]]` values and bare
    /// dates are read as UTC.
    pub fn parse_lenient(input: &str) -> Option<Self> {
        let input = input.trim();
        if let Ok(parsed) = OffsetDateTime::parse(input, &Rfc3339) {
            return Some(Self(parsed.to_offset(UtcOffset::UTC)));
        }

        PrimitiveDateTime::parse(input, NAIVE_DATE_TIME)
            .or_else(|_| PrimitiveDateTime::parse(input, NAIVE_DATE_TIME_SPACED))
            .map(PrimitiveDateTime::assume_utc)
            .or_else(|_| {
                Date::parse(input, CALENDAR_DATE).map(|date| date.midnight().assume_utc())
            })
            .ok()
            .map(Self)
    }

    pub fn from_offset_datetime(value: OffsetDateTime) -> Result<Self, ValidationError> {
        if value.offset() != UtcOffset::UTC {
            return Err(ValidationError::TimestampNotUtc {
                value: value
                    .format(&Rfc3339)
                    .unwrap_or_else(|_| String::from("<unformattable>")),
            });
        }

        Ok(Self(value))
    }

    pub fn unix_millis(self) -> i64 {
        (self.0.unix_timestamp_nanos() / 1_000_000) as i64
    }

    pub fn date(self) -> CalendarDate {
        CalendarDate(self.0.date())
    }

    pub fn format_rfc3339(self) -> String {
        self.0
            .format(&Rfc3339)
            .unwrap_or_else(|_| self.0.unix_timestamp().to_string())
    }
}

impl Display for UtcDateTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_rfc3339())
    }
}

impl Serialize for UtcDateTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_rfc3339())
    }
}

impl<'de> Deserialize<'de> for UtcDateTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

/// Calendar day used as a history bucket key (`YYYY-MM-DD`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(Date);

impl CalendarDate {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Date::parse(input.trim(), CALENDAR_DATE)
            .map(Self)
            .map_err(|_| ValidationError::InvalidDate {
                value: input.to_owned(),
            })
    }

    /// Truncates a source timestamp to its date portion, ignoring any time component.
    ///
    /// Accepts ISO dates and the `DD/MM/YYYY` form some providers emit.
    pub fn from_timestamp_str(input: &str) -> Result<Self, ValidationError> {
        let date_part = input
            .trim()
            .split(['T', ' '])
            .next()
            .unwrap_or_default();
        Self::parse(date_part)
            .or_else(|_| Date::parse(date_part, SLASHED_DATE).map(Self))
            .map_err(|_| ValidationError::InvalidDate {
                value: input.to_owned(),
            })
    }

    /// Today's date on the client clock, in the local offset when it can be determined.
    pub fn today_local() -> Self {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        Self(now.date())
    }

    pub fn format_iso(self) -> String {
        self.0
            .format(CALENDAR_DATE)
            .unwrap_or_else(|_| self.0.to_string())
    }
}

impl Display for CalendarDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_iso())
    }
}

impl Serialize for CalendarDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_iso())
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::from_timestamp_str(&value).map_err(D::Error::custom)
    }
}
