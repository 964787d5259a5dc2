use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::adapters::{fetch_json, lenient_f64, lenient_string};
use crate::data_source::{
    CapabilitySet, FetchFuture, FetchOutcome, RateSource, RawHistory, RawLatest, SourceError,
};
use crate::domain::HistoryQuery;
use crate::http_client::{HttpAuth, HttpClient, HttpRequest};
use crate::ProviderId;

/// Rows requested from `/api/rates` when building the bucketed history.
pub const HISTORY_FEED_LIMIT: usize = 100;

/// `GET /api/rates/latest` body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BackendLatest {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<BackendLatestData>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,
}

/// Latest row per series; any of them may be null.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BackendLatestData {
    #[serde(rename = "BCV", default)]
    pub bcv: Option<BackendRateRecord>,
    #[serde(rename = "BCV_EUR", default)]
    pub bcv_eur: Option<BackendRateRecord>,
    #[serde(rename = "USDT", default)]
    pub usdt: Option<BackendRateRecord>,
}

/// One stored rate row, as the backend names its fields.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BackendRateRecord {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub valor: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub previo: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub porcentaje_cambio: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub cambio: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub fecha: Option<String>,
    /// Older English alias of `previo`.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub previous_value: Option<f64>,
    /// Older English alias of `porcentaje_cambio`.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub change: Option<f64>,
}

/// `GET /api/rates` body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BackendRatesPage {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<Vec<BackendRateRecord>>,
    #[serde(default)]
    pub pagination: Option<Value>,
    #[serde(default)]
    pub filters: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `GET /api` body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BackendStatusPayload {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,
}

/// Adapter for the primary rates backend.
#[derive(Clone)]
pub struct BackendAdapter {
    http_client: Arc<dyn HttpClient>,
    base_url: Option<String>,
    auth: HttpAuth,
    timeout_ms: Option<u64>,
}

impl BackendAdapter {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        base_url: Option<&str>,
        api_key: Option<&str>,
        timeout_ms: Option<u64>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.map(|url| url.trim_end_matches('/').to_owned()),
            auth: HttpAuth::bearer_or_none(api_key),
            timeout_ms,
        }
    }

    fn endpoint(&self, path: &str) -> Result<String, SourceError> {
        self.base_url
            .as_deref()
            .map(|base| format!("{base}{path}"))
            .ok_or_else(|| SourceError::not_configured(ProviderId::Backend))
    }

    fn authenticated_get(&self, path: &str) -> Result<HttpRequest, SourceError> {
        Ok(HttpRequest::get(self.endpoint(path)?)
            .with_header("content-type", "application/json")
            .with_auth(&self.auth)
            .with_timeout_ms(self.timeout_ms))
    }

    /// Fetches one page of `/api/rates` with the given filters.
    pub async fn page(&self, query: &HistoryQuery) -> FetchOutcome<BackendRatesPage> {
        let mut request = self.authenticated_get("/api/rates")?;
        for (name, value) in query.query_pairs() {
            request = request.with_query(name, value);
        }

        let page: BackendRatesPage =
            fetch_json(ProviderId::Backend, self.http_client.as_ref(), request).await?;
        if !page.success {
            return Err(SourceError::rejected(format!(
                "backend history request failed: {}",
                page.error.as_deref().unwrap_or("unknown error")
            )));
        }
        Ok(page)
    }

    /// Probes `GET /api`; the status endpoint takes no credential.
    pub async fn status(&self) -> FetchOutcome<BackendStatusPayload> {
        let request =
            HttpRequest::get(self.endpoint("/api")?).with_timeout_ms(self.timeout_ms);
        fetch_json(ProviderId::Backend, self.http_client.as_ref(), request).await
    }

    async fn fetch_latest(&self) -> FetchOutcome<BackendLatest> {
        let request = self.authenticated_get("/api/rates/latest")?;
        let latest: BackendLatest =
            fetch_json(ProviderId::Backend, self.http_client.as_ref(), request).await?;
        if !latest.success || latest.data.is_none() {
            return Err(SourceError::rejected(
                "backend returned an invalid latest-rates structure",
            ));
        }
        Ok(latest)
    }

    async fn fetch_history_feed(&self) -> FetchOutcome<Vec<BackendRateRecord>> {
        let query = HistoryQuery {
            limit: HISTORY_FEED_LIMIT,
            ..HistoryQuery::default()
        };
        let page = self.page(&query).await?;
        page.data
            .ok_or_else(|| SourceError::rejected("backend history response carried no data"))
    }
}

impl RateSource for BackendAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Backend
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::new(true, true)
    }

    fn latest<'a>(&'a self) -> FetchFuture<'a, RawLatest> {
        Box::pin(async move { self.fetch_latest().await.map(RawLatest::Backend) })
    }

    fn history<'a>(&'a self) -> FetchFuture<'a, RawHistory> {
        Box::pin(async move { self.fetch_history_feed().await.map(RawHistory::Backend) })
    }
}
