use ratefold_core::{ProviderId, SourceFailure, UtcDateTime};
use serde::Serialize;
use uuid::Uuid;

/// Response envelope for every machine-readable `ratefold` output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub meta: EnvelopeMeta,
    pub data: T,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<EnvelopeError>,
}

impl<T> Envelope<T> {
    /// True when every consulted source failed and `data` holds placeholders.
    pub fn all_sources_failed(&self) -> bool {
        !self.errors.is_empty() && self.errors.len() == self.meta.source_chain.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvelopeMeta {
    pub request_id: String,
    pub generated_at: UtcDateTime,
    pub source_chain: Vec<ProviderId>,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl EnvelopeMeta {
    pub fn new(source_chain: Vec<ProviderId>, latency_ms: u64) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            generated_at: UtcDateTime::now(),
            source_chain,
            latency_ms,
            warnings: Vec::new(),
        }
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// Structured provider failure as rendered to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvelopeError {
    pub code: String,
    pub message: String,
    pub retryable: bool,
    pub source: ProviderId,
}

impl From<SourceFailure> for EnvelopeError {
    fn from(failure: SourceFailure) -> Self {
        Self {
            code: failure.code,
            message: failure.message,
            retryable: failure.retryable,
            source: failure.source,
        }
    }
}
