//! Provider adapter contract and its error/outcome types.
//!
//! Every external source implements [`RateSource`]. An adapter performs exactly
//! one upstream round-trip per call and returns the provider's native payload
//! untouched; normalization happens later in [`crate::normalize`].
//!
//! | Endpoint | Method | Payload |
//! |----------|--------|---------|
//! | Latest | [`RateSource::latest`] | [`RawLatest`] |
//! | History | [`RateSource::history`] | [`RawHistory`] |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::adapters::backend::{BackendLatest, BackendRateRecord};
use crate::adapters::official::OfficialRates;
use crate::adapters::official_history::OfficialHistoryRow;
use crate::adapters::p2p::P2pQuote;
use crate::ProviderId;

/// Data endpoint type used for capability checks and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Latest,
    History,
}

impl Endpoint {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::History => "history",
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported endpoint matrix for a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    pub latest: bool,
    pub history: bool,
}

impl CapabilitySet {
    pub const fn new(latest: bool, history: bool) -> Self {
        Self { latest, history }
    }

    pub const fn supports(self, endpoint: Endpoint) -> bool {
        match endpoint {
            Endpoint::Latest => self.latest,
            Endpoint::History => self.history,
        }
    }
}

/// Adapter-level failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceErrorKind {
    /// Network unreachable or connection reset.
    Transport,
    /// No response within the configured request timeout.
    Timeout,
    /// Upstream answered with a non-2xx status.
    Status,
    /// Body was not JSON or not the expected shape.
    Schema,
    /// Well-formed body whose `success` flag or payload says "no data".
    Rejected,
    /// Adapter has no endpoint configured.
    NotConfigured,
    UnsupportedEndpoint,
}

/// Structured provider failure, captured by the orchestrator and never raised past it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Transport,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Timeout,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn status(provider: ProviderId, status: u16) -> Self {
        Self {
            kind: SourceErrorKind::Status,
            message: format!("{provider} upstream returned status {status}"),
            retryable: status == 429 || status >= 500,
        }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Schema,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Rejected,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn not_configured(provider: ProviderId) -> Self {
        Self {
            kind: SourceErrorKind::NotConfigured,
            message: format!("{provider} source has no endpoint configured"),
            retryable: false,
        }
    }

    pub fn unsupported_endpoint(provider: ProviderId, endpoint: Endpoint) -> Self {
        Self {
            kind: SourceErrorKind::UnsupportedEndpoint,
            message: format!("endpoint '{endpoint}' is not supported by {provider}"),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Transport => "source.transport",
            SourceErrorKind::Timeout => "source.timeout",
            SourceErrorKind::Status => "source.status",
            SourceErrorKind::Schema => "source.schema",
            SourceErrorKind::Rejected => "source.rejected",
            SourceErrorKind::NotConfigured => "source.not_configured",
            SourceErrorKind::UnsupportedEndpoint => "source.unsupported_endpoint",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Result of a single provider attempt.
pub type FetchOutcome<T> = Result<T, SourceError>;

/// Boxed future returned by adapter calls.
pub type FetchFuture<'a, T> = Pin<Box<dyn Future<Output = FetchOutcome<T>> + Send + 'a>>;

/// Native "current rates" payload of whichever provider answered.
#[derive(Debug, Clone, PartialEq)]
pub enum RawLatest {
    Backend(BackendLatest),
    Official(OfficialRates),
    P2p(P2pQuote),
}

/// Native history payload of whichever provider answered.
#[derive(Debug, Clone, PartialEq)]
pub enum RawHistory {
    /// One row per series per timestamp; needs bucketing.
    Backend(Vec<BackendRateRecord>),
    /// Already one row per date.
    Official(Vec<OfficialHistoryRow>),
}

/// Provider adapter contract.
///
/// Implementations must not panic or surface transport errors any other way
/// than through the returned [`FetchOutcome`]; they perform no retries.
pub trait RateSource: Send + Sync {
    fn id(&self) -> ProviderId;

    fn capabilities(&self) -> CapabilitySet;

    /// Fetches the provider's current rates.
    fn latest<'a>(&'a self) -> FetchFuture<'a, RawLatest>;

    /// Fetches the provider's history series.
    fn history<'a>(&'a self) -> FetchFuture<'a, RawHistory>;
}
