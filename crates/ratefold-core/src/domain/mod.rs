//! # Domain Models
//!
//! Canonical types every fetch cycle produces.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`RateSnapshot`] | One instrument's price, previous price and change metrics |
//! | [`RateBundle`] | Snapshots for `bcv_usd`, `bcv_eur`, `usdt` plus custom rates |
//! | [`HistoryRecord`] | One calendar-day bucket of the official series |
//! | [`HistoryPage`] | Normalized page of the backend's history endpoint |
//! | [`UtcDateTime`] | UTC timestamp |
//! | [`CalendarDate`] | `YYYY-MM-DD` bucket key |
//!
//! Instances are rebuilt on every request; nothing here is mutated after a
//! cycle hands it to the caller.

mod history;
mod rate;
mod timestamp;

pub use history::{
    filter_range, HistoryEntry, HistoryPage, HistoryQuery, HistoryRecord, P2pPoint, RateName,
    SortOrder,
};
pub use rate::{CustomRate, Instrument, LastUpdate, PartialBundle, RateBundle, RateSnapshot};
pub use timestamp::{CalendarDate, UtcDateTime};
