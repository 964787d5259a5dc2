use thiserror::Error;

/// Validation and contract errors exposed by `ratefold-core`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("setting '{field}' must not be empty")]
    EmptySetting { field: &'static str },
    #[error("setting '{field}' must be an http(s) URL: '{value}'")]
    InvalidUrl { field: &'static str, value: String },
    #[error("setting '{field}' must be a positive integer: '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    #[error("custom rate must be written as name=value: '{value}'")]
    InvalidCustomRate { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
    #[error("invalid calendar date '{value}', expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("invalid sort order '{value}', expected asc or desc")]
    InvalidOrder { value: String },
    #[error("invalid instrument '{value}', expected one of bcv_usd, bcv_eur, usdt")]
    InvalidInstrument { value: String },
    #[error("invalid source '{value}', expected one of backend, official, p2p, official_history")]
    InvalidSource { value: String },
    #[error("invalid conversion mode '{value}', expected usd_to_bs or bs_to_usd")]
    InvalidConversionMode { value: String },
    #[error("history limit must be greater than zero")]
    ZeroLimit,
}
