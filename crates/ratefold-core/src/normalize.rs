//! Maps provider-native payloads onto the canonical snapshot schema.
//!
//! | Canonical field | Backend | Official provider | P2P provider |
//! |-----------------|---------|-------------------|--------------|
//! | `price` | `valor` | `current.usd` / `current.eur` | `rate` |
//! | `previous_price` | `previo` | `previous.usd` / `previous.eur` | 0 |
//! | `percent_change` | `porcentaje_cambio`, else derived | `changePercentage.*`, else derived | 0 |
//! | `absolute_change` | `cambio`, else derived | derived | 0 |
//! | `last_update` | `fecha`, else response `timestamp`, else fetch time | `current.date`, else fetch time | fetch time |
//!
//! Change values a source provides are passed through untouched, even when they
//! disagree with `price - previous_price`.

use crate::adapters::backend::{BackendLatest, BackendRateRecord};
use crate::adapters::official::OfficialRates;
use crate::adapters::p2p::P2pQuote;
use crate::data_source::RawLatest;
use crate::domain::{
    CalendarDate, HistoryEntry, LastUpdate, PartialBundle, RateBundle, RateName, RateSnapshot,
    UtcDateTime,
};

/// Normalizes one payload into a full bundle; instruments it lacks are zero-filled.
pub fn normalize(
    raw: &RawLatest,
    fetched_at: UtcDateTime,
    fallback_date: CalendarDate,
) -> RateBundle {
    normalize_partial(raw, fetched_at).into_bundle(fallback_date)
}

/// Normalizes one payload, leaving instruments the source does not cover as `None`.
pub fn normalize_partial(raw: &RawLatest, fetched_at: UtcDateTime) -> PartialBundle {
    match raw {
        RawLatest::Backend(latest) => from_backend(latest, fetched_at),
        RawLatest::Official(rates) => from_official(rates, fetched_at),
        RawLatest::P2p(quote) => from_p2p(quote, fetched_at),
    }
}

/// Normalizes one row of the paginated history endpoint.
pub fn normalize_entry(record: &BackendRateRecord) -> HistoryEntry {
    let value = non_negative("valor", record.valor.unwrap_or(0.0));
    let previous_value = non_negative(
        "previo",
        record.previo.or(record.previous_value).unwrap_or(0.0),
    );
    let (percent_change, absolute_change) = resolve_changes(
        value,
        previous_value,
        record.porcentaje_cambio.or(record.change),
        record.cambio,
    );
    let date = record.fecha.clone().unwrap_or_default();
    let timestamp = UtcDateTime::parse_lenient(&date).map(UtcDateTime::unix_millis);

    HistoryEntry {
        id: record.id.clone(),
        name: RateName::from(record.nombre.clone().unwrap_or_default()),
        value,
        previous_value,
        percent_change,
        absolute_change,
        date,
        timestamp,
    }
}

fn from_backend(latest: &BackendLatest, fetched_at: UtcDateTime) -> PartialBundle {
    let Some(data) = &latest.data else {
        return PartialBundle::default();
    };
    let snapshot = |record: &BackendRateRecord| {
        let price = non_negative("valor", record.valor.unwrap_or(0.0));
        let previous_price = non_negative("previo", record.previo.unwrap_or(0.0));
        let (percent_change, absolute_change) = resolve_changes(
            price,
            previous_price,
            record.porcentaje_cambio,
            record.cambio,
        );
        let last_update = record
            .fecha
            .clone()
            .or_else(|| latest.timestamp.clone())
            .map_or(LastUpdate::Fetched(fetched_at), LastUpdate::Reported);

        RateSnapshot {
            price,
            previous_price,
            percent_change,
            absolute_change,
            last_update,
        }
    };

    PartialBundle {
        bcv_usd: data.bcv.as_ref().map(snapshot),
        bcv_eur: data.bcv_eur.as_ref().map(snapshot),
        usdt: data.usdt.as_ref().map(snapshot),
    }
}

fn from_official(rates: &OfficialRates, fetched_at: UtcDateTime) -> PartialBundle {
    let last_update = rates
        .current
        .date
        .clone()
        .map_or(LastUpdate::Fetched(fetched_at), LastUpdate::Reported);
    let previous = rates.previous.clone().unwrap_or_default();
    let change_percentage = rates.change_percentage.clone().unwrap_or_default();

    let snapshot = |current: Option<f64>, previous: Option<f64>, percent: Option<f64>| {
        let price = non_negative("current", current.unwrap_or(0.0));
        let previous_price = non_negative("previous", previous.unwrap_or(0.0));
        let (percent_change, absolute_change) =
            resolve_changes(price, previous_price, percent, None);
        RateSnapshot {
            price,
            previous_price,
            percent_change,
            absolute_change,
            last_update: last_update.clone(),
        }
    };

    PartialBundle {
        bcv_usd: Some(snapshot(
            rates.current.usd,
            previous.usd,
            change_percentage.usd,
        )),
        bcv_eur: Some(snapshot(
            rates.current.eur,
            previous.eur,
            change_percentage.eur,
        )),
        usdt: None,
    }
}

fn from_p2p(quote: &P2pQuote, fetched_at: UtcDateTime) -> PartialBundle {
    PartialBundle {
        usdt: Some(RateSnapshot {
            price: non_negative("rate", quote.rate.unwrap_or(0.0)),
            previous_price: 0.0,
            percent_change: 0.0,
            absolute_change: 0.0,
            last_update: LastUpdate::Fetched(fetched_at),
        }),
        ..PartialBundle::default()
    }
}

/// Source-provided changes win; otherwise derive from the previous price when one is known.
///
/// With no previous price (0) both derived changes are 0 rather than `price - 0`, so
/// a first observation never reads as a jump from zero.
fn resolve_changes(
    price: f64,
    previous_price: f64,
    percent: Option<f64>,
    absolute: Option<f64>,
) -> (f64, f64) {
    let derived_absolute = if previous_price > 0.0 {
        price - previous_price
    } else {
        0.0
    };
    let derived_percent = if previous_price > 0.0 {
        derived_absolute / previous_price * 100.0
    } else {
        0.0
    };

    (
        percent.unwrap_or(derived_percent),
        absolute.unwrap_or(derived_absolute),
    )
}

fn non_negative(field: &'static str, value: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        return value;
    }
    tracing::warn!(field, value, "discarding negative or non-finite rate value");
    0.0
}
