use std::sync::Arc;

use serde::Deserialize;

use crate::adapters::{fetch_json, lenient_f64, lenient_string, OFFICIAL_KEY_HEADER};
use crate::data_source::{
    CapabilitySet, Endpoint, FetchFuture, RateSource, RawHistory, RawLatest, SourceError,
};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest};
use crate::ProviderId;

/// Official-rate provider body. `current` is mandatory; without it the payload is unusable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficialRates {
    pub current: OfficialCurrent,
    #[serde(default)]
    pub previous: Option<OfficialPair>,
    #[serde(default)]
    pub change_percentage: Option<OfficialPair>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OfficialCurrent {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub usd: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub eur: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OfficialPair {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub usd: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub eur: Option<f64>,
}

/// Adapter for the external official (central bank) rate provider.
#[derive(Clone)]
pub struct OfficialRateAdapter {
    http_client: Arc<dyn HttpClient>,
    url: Option<String>,
    auth: HttpAuth,
    timeout_ms: Option<u64>,
}

impl OfficialRateAdapter {
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

impl RateSource for OfficialRateAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Official
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
            let request = HttpRequest::get(url)
                .with_auth(&self.auth)
                .with_timeout_ms(self.timeout_ms);

            fetch_json(self.id(), self.http_client.as_ref(), request)
                .await
                .map(RawLatest::Official)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_support::{block_on, RecordingHttpClient};
    use crate::data_source::SourceErrorKind;

    #[test]
    fn latest_applies_custom_key_header() {
        let client = Arc::new(RecordingHttpClient::json(
            r#"{"current":{"usd":40,"eur":43,"date":"2024-01-02"},"previous":{"usd":39},"changePercentage":{"usd":2.56}}"#,
        ));
        let adapter = OfficialRateAdapter::new(
            client.clone(),
            Some("https://official.example/api/v1/dollar"),
            Some("official-key"),
            None,
        );

        let RawLatest::Official(rates) = block_on(adapter.latest()).expect("latest") else {
            panic!("official adapter must return an official payload");
        };
        assert_eq!(rates.current.usd, Some(40.0));
        assert_eq!(rates.previous.and_then(|p| p.usd), Some(39.0));
        assert_eq!(rates.change_percentage.and_then(|p| p.eur), None);

        let requests = client.recorded_requests();
        assert_eq!(
            requests[0].headers.get(OFFICIAL_KEY_HEADER).map(String::as_str),
            Some("official-key")
        );
    }

    #[test]
    fn missing_current_block_is_a_schema_failure() {
        let client = Arc::new(RecordingHttpClient::json(r#"{"previous":{"usd":39}}"#));
        let adapter =
            OfficialRateAdapter::new(client, Some("https://official.example"), None, None);

        let error = block_on(adapter.latest()).expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::Schema);
        assert!(error.message().contains("official"));
    }

    #[test]
    fn history_is_unsupported() {
        let client = Arc::new(RecordingHttpClient::json("{}"));
        let adapter =
            OfficialRateAdapter::new(client.clone(), Some("https://official.example"), None, None);

        let error = block_on(adapter.history()).expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::UnsupportedEndpoint);
        assert!(client.recorded_requests().is_empty());
    }
}
