//! Core contracts for ratefold.
//!
//! This crate contains:
//! - Canonical rate/history models and validation
//! - Provider identifiers, adapters and the transport seam
//! - The normalizer and the history aggregator
//! - The never-failing fallback orchestrator ([`RateService`])
//! - Caller-side helpers: calculator, change notices, refresh limiter

pub mod adapters;
pub mod aggregate;
pub mod calculator;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod normalize;
pub mod notice;
pub mod service;
pub mod source;
pub mod throttling;

pub use adapters::{BackendAdapter, OfficialHistoryAdapter, OfficialRateAdapter, P2pAdapter};
pub use aggregate::{aggregate, aggregate_official};
pub use calculator::{convert, ConversionMode};
pub use config::{CustomRateConfig, RatesConfig, DEFAULT_TIMEOUT_MS};
pub use data_source::{
    CapabilitySet, Endpoint, FetchFuture, FetchOutcome, RateSource, RawHistory, RawLatest,
    SourceError, SourceErrorKind,
};
pub use domain::{
    filter_range, CalendarDate, CustomRate, HistoryEntry, HistoryPage, HistoryQuery,
    HistoryRecord, Instrument, LastUpdate, P2pPoint, PartialBundle, RateBundle, RateName,
    RateSnapshot, SortOrder, UtcDateTime,
};
pub use error::ValidationError;
pub use http_client::{HttpAuth, HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use normalize::{normalize, normalize_entry, normalize_partial};
pub use notice::{evaluate_change, ChangeEvaluation, ChangeNotice, LastSeenRates};
pub use service::{BackendStatus, RateService, RouteReport, SourceFailure, DEFAULT_SERIES_LIMIT};
pub use source::ProviderId;
pub use throttling::RefreshLimiter;
