//! Rate-change notices derived by comparing a fresh bundle with caller-held values.
//!
//! The caller owns [`LastSeenRates`] (a settings store, a file, memory) and
//! feeds it back on the next cycle. Delivery of the notice is up to the caller.

use serde::{Deserialize, Serialize};

use crate::domain::RateBundle;

pub const NOTICE_TITLE: &str = "Nueva Tasa";

/// Prices the caller last acknowledged; `None` means never seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LastSeenRates {
    pub bcv_usd: Option<f64>,
    pub bcv_eur: Option<f64>,
    pub usdt: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotice {
    pub title: String,
    pub lines: Vec<String>,
}

impl ChangeNotice {
    pub fn body(&self) -> String {
        self.lines.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvaluation {
    pub notice: Option<ChangeNotice>,
    /// Values to store for the next comparison.
    pub last_seen: LastSeenRates,
}

/// Compares `bundle` with `last_seen`.
///
/// Nothing is evaluated while either official price is zero, so a failed fetch
/// never overwrites the stored values. Otherwise each instrument with a stored
/// value that differs from the new price contributes one line, and the returned
/// `last_seen` holds all three new prices.
pub fn evaluate_change(last_seen: &LastSeenRates, bundle: &RateBundle) -> ChangeEvaluation {
    let usd = bundle.bcv_usd.price;
    let eur = bundle.bcv_eur.price;
    let usdt = bundle.usdt.price;

    if usd == 0.0 || eur == 0.0 {
        return ChangeEvaluation {
            notice: None,
            last_seen: *last_seen,
        };
    }

    let lines: Vec<String> = [
        ("Dólar BCV", last_seen.bcv_usd, usd),
        ("Euro BCV", last_seen.bcv_eur, eur),
        ("P2P", last_seen.usdt, usdt),
    ]
    .into_iter()
    .filter(|(_, previous, current)| previous.is_some_and(|previous| previous != *current))
    .map(|(label, _, current)| format!("{label}: {current} Bs"))
    .collect();

    let notice = (!lines.is_empty()).then(|| ChangeNotice {
        title: NOTICE_TITLE.to_owned(),
        lines,
    });

    ChangeEvaluation {
        notice,
        last_seen: LastSeenRates {
            bcv_usd: Some(usd),
            bcv_eur: Some(eur),
            usdt: Some(usdt),
        },
    }
}
