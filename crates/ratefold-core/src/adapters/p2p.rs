use std::sync::Arc;

use serde::Deserialize;

use crate::adapters::{fetch_json, lenient_f64};
use crate::data_source::{
    CapabilitySet, Endpoint, FetchFuture, RateSource, RawHistory, RawLatest, SourceError,
};
use crate::http_client::{HttpClient, HttpRequest};
use crate::ProviderId;

/// P2P provider body: a single market rate.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct P2pQuote {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rate: Option<f64>,
}

/// Adapter for the unauthenticated P2P/parallel-market provider.
#[derive(Clone)]
pub struct P2pAdapter {
    http_client: Arc<dyn HttpClient>,
    url: Option<String>,
    timeout_ms: Option<u64>,
}

impl P2pAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, url: Option<&str>, timeout_ms: Option<u64>) -> Self {
        Self {
            http_client,
            url: url.map(str::to_owned),
            timeout_ms,
        }
    }
}

impl RateSource for P2pAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::P2p
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::new(true, false)
    }

    fn latest<'a>(&'a self) -> FetchFuture<'a, RawLatest> {
        Box::pin(async move {
            let url = self
                .url
                .as_deref()
                .ok_or_else(|| SourceError::not_configured(self.id()))?;
            let request = HttpRequest::get(url).with_timeout_ms(self.timeout_ms);

            let quote: P2pQuote = fetch_json(self.id(), self.http_client.as_ref(), request).await?;
            // A body without a usable rate carries nothing to fill `usdt` with.
            if quote.rate.map_or(true, |rate| rate <= 0.0) {
                return Err(SourceError::rejected("p2p response carried no positive rate"));
            }
            Ok(RawLatest::P2p(quote))
        })
    }

    fn history<'a>(&'a self) -> FetchFuture<'a, RawHistory> {
        Box::pin(async move {
            Err(SourceError::unsupported_endpoint(
                self.id(),
                Endpoint::History,
            ))
        })
    }
}
