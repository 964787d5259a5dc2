use std::sync::Arc;

use serde::Deserialize;

use crate::adapters::{fetch_json, lenient_f64, lenient_string, OFFICIAL_KEY_HEADER};
use crate::data_source::{
    CapabilitySet, Endpoint, FetchFuture, RateSource, RawHistory, RawLatest, SourceError,
};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest};
use crate::ProviderId;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
struct OfficialHistoryBody {
    #[serde(default)]
    rates: Option<Vec<OfficialHistoryRow>>,
}

/// One dated row of the official history provider.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OfficialHistoryRow {
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub usd: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub eur: Option<f64>,
}

/// Adapter for the external history provider (same key header as the official provider).
#[derive(Clone)]
pub struct OfficialHistoryAdapter {
    http_client: Arc<dyn HttpClient>,
    url: Option<String>,
    auth: HttpAuth,
    timeout_ms: Option<u64>,
}

impl OfficialHistoryAdapter {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        url: Option<&str>,
        api_key: Option<&str>,
        timeout_ms: Option<u64>,
    ) -> Self {
        Self {
            http_client,
            url: url.map(str::to_owned),
            auth: HttpAuth::header_or_none(OFFICIAL_KEY_HEADER, api_key),
            timeout_ms,
        }
    }
}

impl RateSource for OfficialHistoryAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::OfficialHistory
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::new(false, true)
    }

    fn latest<'a>(&'a self) -> FetchFuture<'a, RawLatest> {
        Box::pin(async move {
            Err(SourceError::unsupported_endpoint(
                self.id(),
                Endpoint::Latest,
            ))
        })
    }

    fn history<'a>(&'a self) -> FetchFuture<'a, RawHistory> {
        Box::pin(async move {
            let url = self
                .url
                .as_deref()
                .ok_or_else(|| SourceError::not_configured(self.id()))?;
            let request = HttpRequest::get(url)
                .with_auth(&self.auth)
                .with_timeout_ms(self.timeout_ms);

            let body: OfficialHistoryBody =
                fetch_json(self.id(), self.http_client.as_ref(), request).await?;
            body.rates
                .map(RawHistory::Official)
                .ok_or_else(|| SourceError::rejected("official history response has no rates list"))
        })
    }
}
