//! Turns dated rate rows into [`HistoryRecord`]s ordered newest first.

use std::collections::HashMap;

use crate::adapters::backend::BackendRateRecord;
use crate::adapters::official_history::OfficialHistoryRow;
use crate::data_source::RawHistory;
use crate::domain::{CalendarDate, HistoryRecord, RateName};

/// Buckets backend rows by date and orders the buckets newest first.
///
/// `BCV` always sets `usd` and `BCV_EUR` always sets `eur`. A `USDT` row only
/// fills `usd` while it is still zero, so the official rate wins regardless of
/// arrival order. Rows with an unparseable date are skipped.
pub fn aggregate(records: &[BackendRateRecord]) -> Vec<HistoryRecord> {
    let mut buckets = Buckets::default();

    for record in records {
        let Some(date) = bucket_date(record.fecha.as_deref()) else {
            continue;
        };
        let value = record.valor.unwrap_or(0.0);
        let bucket = buckets.entry(date);

        match record.nombre.clone().map(RateName::from) {
            Some(RateName::Bcv) => bucket.usd = value,
            Some(RateName::BcvEur) => bucket.eur = value,
            Some(RateName::Usdt) if bucket.usd == 0.0 => bucket.usd = value,
            _ => {}
        }
    }

    buckets.into_descending()
}

/// Maps each history provider row to one record and orders them newest first.
///
/// Rows sharing a date stay separate entries in input order. Rows whose date
/// cannot be read are skipped.
pub fn aggregate_official(rows: &[OfficialHistoryRow]) -> Vec<HistoryRecord> {
    let mut records: Vec<HistoryRecord> = rows
        .iter()
        .filter_map(|row| {
            let date = bucket_date(row.date.as_deref())?;
            Some(HistoryRecord {
                date,
                usd: row.usd.unwrap_or(0.0),
                eur: row.eur.unwrap_or(0.0),
            })
        })
        .collect();

    records.sort_by(|left, right| right.date.cmp(&left.date));
    records
}

/// Dispatches on the history payload shape.
pub fn aggregate_raw(raw: &RawHistory) -> Vec<HistoryRecord> {
    match raw {
        RawHistory::Backend(records) => aggregate(records),
        RawHistory::Official(rows) => aggregate_official(rows),
    }
}

fn bucket_date(raw: Option<&str>) -> Option<CalendarDate> {
    let raw = raw.unwrap_or_default();
    match CalendarDate::from_timestamp_str(raw) {
        Ok(date) => Some(date),
        Err(error) => {
            tracing::warn!(date = raw, %error, "skipping history row with unusable date");
            None
        }
    }
}

/// Buckets in first-seen order, so the final stable sort keeps input order for ties.
#[derive(Default)]
struct Buckets {
    index: HashMap<CalendarDate, usize>,
    records: Vec<HistoryRecord>,
}

impl Buckets {
    fn entry(&mut self, date: CalendarDate) -> &mut HistoryRecord {
        let slot = *self.index.entry(date).or_insert_with(|| {
            self.records.push(HistoryRecord::empty(date));
            self.records.len() - 1
        });
        &mut self.records[slot]
    }

    fn into_descending(mut self) -> Vec<HistoryRecord> {
        self.records.sort_by(|left, right| right.date.cmp(&left.date));
        self.records
    }
}
