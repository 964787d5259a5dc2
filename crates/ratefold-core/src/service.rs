//! Fallback orchestration over the configured rate sources.
//!
//! `current_rates` asks the primary tier in order and returns the first success.
//! When every primary source fails, the secondary sources (official and P2P)
//! run concurrently and their partial bundles are merged. History walks its own
//! chain the same way. None of the outbound operations ever return an error:
//! failures are logged, recorded in the [`RouteReport`] and replaced by
//! zero-filled or empty defaults.

use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};

use crate::adapters::{BackendAdapter, OfficialHistoryAdapter, OfficialRateAdapter, P2pAdapter};
use crate::aggregate::aggregate_raw;
use crate::config::{CustomRateConfig, RatesConfig};
use crate::data_source::{Endpoint, FetchOutcome, RateSource, RawHistory, RawLatest, SourceError};
use crate::domain::{
    CalendarDate, CustomRate, HistoryPage, HistoryQuery, HistoryRecord, PartialBundle, RateBundle,
    RateName, RateSnapshot, UtcDateTime,
};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::normalize::{normalize, normalize_entry, normalize_partial};
use crate::{ProviderId, ValidationError};

/// Default page size for the per-series history shortcuts.
pub const DEFAULT_SERIES_LIMIT: usize = 50;

/// One captured provider failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source: ProviderId,
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl SourceFailure {
    fn capture(source: ProviderId, error: SourceError) -> Self {
        log_failure(source, &error);
        Self {
            source,
            code: error.code().to_owned(),
            message: error.message().to_owned(),
            retryable: error.retryable(),
        }
    }
}

/// Result of one orchestrated call plus the diagnostics behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteReport<T> {
    pub data: T,
    /// Every source consulted, in the order it was asked.
    pub source_chain: Vec<ProviderId>,
    pub failures: Vec<SourceFailure>,
    pub latency_ms: u64,
}

impl<T> RouteReport<T> {
    /// True when at least one source produced the data.
    pub fn served_by_source(&self) -> bool {
        self.failures.len() < self.source_chain.len()
    }
}

/// Reachability of the primary backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendStatus {
    pub online: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Rate client that never fails: every outbound call resolves to data or a default.
#[derive(Clone)]
pub struct RateService {
    primary: Vec<Arc<dyn RateSource>>,
    secondary: Vec<Arc<dyn RateSource>>,
    history_chain: Vec<Arc<dyn RateSource>>,
    backend: Arc<BackendAdapter>,
    custom_rates: Vec<CustomRate>,
}

impl RateService {
    /// Builds the standard source layout over a reqwest client.
    pub fn new(config: &RatesConfig) -> Result<Self, ValidationError> {
        Self::with_http_client(config, Arc::new(ReqwestHttpClient::new()))
    }

    /// Builds the standard source layout over any [`HttpClient`].
    ///
    /// History consults the external history provider only when its URL is set.
    pub fn with_http_client(
        config: &RatesConfig,
        http_client: Arc<dyn HttpClient>,
    ) -> Result<Self, ValidationError> {
        config.validate()?;

        let backend = Arc::new(BackendAdapter::new(
            Arc::clone(&http_client),
            config.backend_base(),
            config.backend_key.as_deref(),
            config.timeout_ms,
        ));
        let official: Arc<dyn RateSource> = Arc::new(OfficialRateAdapter::new(
            Arc::clone(&http_client),
            config.official_provider_url.as_deref(),
            config.official_provider_key.as_deref(),
            config.timeout_ms,
        ));
        let p2p: Arc<dyn RateSource> = Arc::new(P2pAdapter::new(
            Arc::clone(&http_client),
            config.p2p_provider_url.as_deref(),
            config.timeout_ms,
        ));

        let backend_source: Arc<dyn RateSource> = backend.clone();
        let mut history_chain: Vec<Arc<dyn RateSource>> = Vec::with_capacity(2);
        if config.history_provider_url.is_some() {
            history_chain.push(Arc::new(OfficialHistoryAdapter::new(
                Arc::clone(&http_client),
                config.history_provider_url.as_deref(),
                config.official_provider_key.as_deref(),
                config.timeout_ms,
            )));
        }
        history_chain.push(Arc::clone(&backend_source));

        Ok(Self {
            primary: vec![backend_source],
            secondary: vec![official, p2p],
            history_chain,
            backend,
            custom_rates: Vec::new(),
        }
        .with_custom_rates(&config.custom_rates))
    }

    /// Assembles a service from explicit source tiers.
    ///
    /// `backend` still serves the paginated history and status probe.
    pub fn from_sources(
        primary: Vec<Arc<dyn RateSource>>,
        secondary: Vec<Arc<dyn RateSource>>,
        history_chain: Vec<Arc<dyn RateSource>>,
        backend: Arc<BackendAdapter>,
    ) -> Self {
        Self {
            primary,
            secondary,
            history_chain,
            backend,
            custom_rates: Vec::new(),
        }
    }

    pub fn with_custom_rates(mut self, rates: &[CustomRateConfig]) -> Self {
        self.custom_rates = rates
            .iter()
            .map(|rate| CustomRate {
                name: rate.name.clone(),
                snapshot: RateSnapshot::user_defined(rate.value),
            })
            .collect();
        self
    }

    /// Current rates for every instrument; zero-filled when nothing answers.
    pub async fn current_rates(&self) -> RateBundle {
        self.current_rates_report().await.data
    }

    pub async fn current_rates_report(&self) -> RouteReport<RateBundle> {
        let started = Instant::now();
        let fetched_at = UtcDateTime::now();
        let fallback_date = CalendarDate::today_local();
        let mut source_chain = Vec::with_capacity(self.primary.len() + self.secondary.len());
        let mut failures = Vec::new();

        for source in &self.primary {
            let provider = source.id();
            source_chain.push(provider);
            match attempt_latest(source.as_ref()).await {
                Ok(raw) => {
                    tracing::info!(source = %provider, "current rates served by primary source");
                    return RouteReport {
                        data: self.finish(normalize(&raw, fetched_at, fallback_date)),
                        source_chain,
                        failures,
                        latency_ms: elapsed_ms(started),
                    };
                }
                Err(error) => failures.push(SourceFailure::capture(provider, error)),
            }
        }

        let outcomes = join_all(self.secondary.iter().map(|source| async move {
            (source.id(), attempt_latest(source.as_ref()).await)
        }))
        .await;

        let mut merged = PartialBundle::default();
        for (provider, outcome) in outcomes {
            source_chain.push(provider);
            match outcome {
                Ok(raw) => merged.merge(normalize_partial(&raw, fetched_at)),
                Err(error) => failures.push(SourceFailure::capture(provider, error)),
            }
        }

        if merged.is_empty() {
            tracing::warn!(
                failed = failures.len(),
                "every rate source failed, serving zero-filled rates"
            );
        } else {
            tracing::info!(failed = failures.len(), "current rates served by secondary sources");
        }

        RouteReport {
            data: self.finish(merged.into_bundle(fallback_date)),
            source_chain,
            failures,
            latency_ms: elapsed_ms(started),
        }
    }

    /// Official history bucketed per date, newest first; empty when nothing answers.
    pub async fn history(&self) -> Vec<HistoryRecord> {
        self.history_report().await.data
    }

    pub async fn history_report(&self) -> RouteReport<Vec<HistoryRecord>> {
        let started = Instant::now();
        let mut source_chain = Vec::with_capacity(self.history_chain.len());
        let mut failures = Vec::new();

        for source in &self.history_chain {
            let provider = source.id();
            source_chain.push(provider);
            match attempt_history(source.as_ref()).await {
                Ok(raw) => {
                    let records = aggregate_raw(&raw);
                    tracing::info!(source = %provider, buckets = records.len(), "history served");
                    return RouteReport {
                        data: records,
                        source_chain,
                        failures,
                        latency_ms: elapsed_ms(started),
                    };
                }
                Err(error) => failures.push(SourceFailure::capture(provider, error)),
            }
        }

        tracing::warn!(failed = failures.len(), "every history source failed, serving no history");
        RouteReport {
            data: Vec::new(),
            source_chain,
            failures,
            latency_ms: elapsed_ms(started),
        }
    }

    /// One normalized page of the backend's history endpoint; an empty page on failure.
    pub async fn history_advanced(&self, query: &HistoryQuery) -> HistoryPage {
        match self.backend.page(query).await {
            Ok(page) => HistoryPage {
                records: page
                    .data
                    .unwrap_or_default()
                    .iter()
                    .map(normalize_entry)
                    .collect(),
                pagination: page.pagination,
                filters: page.filters,
            },
            Err(error) => {
                log_failure(ProviderId::Backend, &error);
                HistoryPage::empty()
            }
        }
    }

    pub async fn usdt_history(&self, limit: usize) -> HistoryPage {
        self.series_history(RateName::Usdt, limit).await
    }

    pub async fn bcv_history(&self, limit: usize) -> HistoryPage {
        self.series_history(RateName::Bcv, limit).await
    }

    /// Probes the backend; never fails, reports `online: false` with the reason instead.
    pub async fn check_backend_status(&self) -> BackendStatus {
        match self.backend.status().await {
            Ok(payload) => BackendStatus {
                online: payload.status.as_deref() == Some("online"),
                name: payload.name,
                version: payload.version,
                timestamp: payload.timestamp,
                error: None,
            },
            Err(error) => {
                log_failure(ProviderId::Backend, &error);
                BackendStatus {
                    online: false,
                    error: Some(error.message().to_owned()),
                    ..BackendStatus::default()
                }
            }
        }
    }

    async fn series_history(&self, name: RateName, limit: usize) -> HistoryPage {
        match HistoryQuery::for_name(name, limit) {
            Ok(query) => self.history_advanced(&query).await,
            Err(error) => {
                tracing::warn!(%error, "rejected history query");
                HistoryPage::empty()
            }
        }
    }

    fn finish(&self, mut bundle: RateBundle) -> RateBundle {
        bundle.custom = self.custom_rates.clone();
        bundle
    }
}

fn log_failure(source: ProviderId, error: &SourceError) {
    tracing::warn!(
        source = %source,
        code = error.code(),
        reason = error.message(),
        "rate source attempt failed"
    );
}

async fn attempt_latest(source: &dyn RateSource) -> FetchOutcome<RawLatest> {
    if !source.capabilities().supports(Endpoint::Latest) {
        return Err(SourceError::unsupported_endpoint(source.id(), Endpoint::Latest));
    }
    source.latest().await
}

async fn attempt_history(source: &dyn RateSource) -> FetchOutcome<RawHistory> {
    if !source.capabilities().supports(Endpoint::History) {
        return Err(SourceError::unsupported_endpoint(source.id(), Endpoint::History));
    }
    source.history().await
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::adapters::backend::{BackendLatest, BackendLatestData, BackendRateRecord};
    use crate::adapters::official::{OfficialCurrent, OfficialPair, OfficialRates};
    use crate::adapters::official_history::OfficialHistoryRow;
    use crate::adapters::p2p::P2pQuote;
    use crate::adapters::test_support::{block_on, RecordingHttpClient};
    use crate::data_source::{CapabilitySet, FetchFuture};
    use crate::domain::LastUpdate;

    struct StubSource {
        id: ProviderId,
        latest: FetchOutcome<RawLatest>,
        history: FetchOutcome<RawHistory>,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn serving_latest(id: ProviderId, latest: FetchOutcome<RawLatest>) -> Arc<Self> {
            Arc::new(Self {
                id,
                latest,
                history: Err(SourceError::unsupported_endpoint(id, Endpoint::History)),
                calls: AtomicUsize::new(0),
            })
        }

        fn serving_history(id: ProviderId, history: FetchOutcome<RawHistory>) -> Arc<Self> {
            Arc::new(Self {
                id,
                latest: Err(SourceError::unsupported_endpoint(id, Endpoint::Latest)),
                history,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RateSource for StubSource {
        fn id(&self) -> ProviderId {
            self.id
        }

        fn capabilities(&self) -> CapabilitySet {
            CapabilitySet::new(true, true)
        }

        fn latest<'a>(&'a self) -> FetchFuture<'a, RawLatest> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let outcome = self.latest.clone();
            Box::pin(async move { outcome })
        }

        fn history<'a>(&'a self) -> FetchFuture<'a, RawHistory> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let outcome = self.history.clone();
            Box::pin(async move { outcome })
        }
    }

    fn down(provider: ProviderId) -> SourceError {
        SourceError::status(provider, 503)
    }

    fn backend_with(bcv: f64) -> RawLatest {
        RawLatest::Backend(BackendLatest {
            success: true,
            data: Some(BackendLatestData {
                bcv: Some(BackendRateRecord {
                    valor: Some(bcv),
                    ..BackendRateRecord::default()
                }),
                ..BackendLatestData::default()
            }),
            timestamp: Some(String::from("2024-01-05T12:00:00Z")),
        })
    }

    fn official_with(usd: f64, eur: f64, previous_usd: f64) -> RawLatest {
        RawLatest::Official(OfficialRates {
            current: OfficialCurrent {
                usd: Some(usd),
                eur: Some(eur),
                date: None,
            },
            previous: Some(OfficialPair {
                usd: Some(previous_usd),
                eur: None,
            }),
            change_percentage: None,
        })
    }

    fn idle_backend() -> Arc<BackendAdapter> {
        Arc::new(BackendAdapter::new(
            Arc::new(RecordingHttpClient::json("{}")),
            None,
            None,
            None,
        ))
    }

    fn service(
        primary: Arc<StubSource>,
        official: Arc<StubSource>,
        p2p: Arc<StubSource>,
    ) -> RateService {
        RateService::from_sources(
            vec![primary],
            vec![official, p2p],
            Vec::new(),
            idle_backend(),
        )
    }

    #[test]
    fn primary_success_short_circuits_secondaries() {
        let primary = StubSource::serving_latest(ProviderId::Backend, Ok(backend_with(36.5)));
        let official = StubSource::serving_latest(ProviderId::Official, Ok(official_with(40.0, 43.0, 39.0)));
        let p2p = StubSource::serving_latest(ProviderId::P2p, Ok(RawLatest::P2p(P2pQuote { rate: Some(38.0) })));

        let report = block_on(service(primary, official.clone(), p2p.clone()).current_rates_report());

        assert_eq!(report.data.bcv_usd.price, 36.5);
        assert_eq!(report.source_chain, vec![ProviderId::Backend]);
        assert!(report.failures.is_empty());
        assert_eq!(official.calls(), 0);
        assert_eq!(p2p.calls(), 0);
    }

    #[test]
    fn secondaries_fill_independently_when_primary_fails() {
        let primary = StubSource::serving_latest(ProviderId::Backend, Err(down(ProviderId::Backend)));
        let official = StubSource::serving_latest(ProviderId::Official, Ok(official_with(40.0, 43.0, 39.0)));
        let p2p = StubSource::serving_latest(ProviderId::P2p, Err(down(ProviderId::P2p)));

        let report = block_on(service(primary, official, p2p).current_rates_report());

        assert_eq!(report.data.bcv_usd.price, 40.0);
        assert_eq!(report.data.bcv_usd.previous_price, 39.0);
        assert_eq!(report.data.bcv_eur.price, 43.0);
        assert_eq!(report.data.usdt.price, 0.0);
        assert!(report.data.usdt.last_update.is_unavailable());
        assert_eq!(
            report.source_chain,
            vec![ProviderId::Backend, ProviderId::Official, ProviderId::P2p]
        );
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[1].code, "source.status");
        assert!(report.served_by_source());
    }

    #[test]
    fn total_failure_yields_zero_filled_bundle() {
        let primary = StubSource::serving_latest(ProviderId::Backend, Err(down(ProviderId::Backend)));
        let official = StubSource::serving_latest(ProviderId::Official, Err(SourceError::schema("bad")));
        let p2p = StubSource::serving_latest(ProviderId::P2p, Err(SourceError::transport("reset")));

        let report = block_on(service(primary, official, p2p).current_rates_report());

        for snapshot in [&report.data.bcv_usd, &report.data.bcv_eur, &report.data.usdt] {
            assert_eq!(snapshot.price, 0.0);
            assert!(matches!(snapshot.last_update, LastUpdate::Unavailable(_)));
        }
        assert_eq!(report.failures.len(), 3);
        assert!(!report.served_by_source());
    }

    #[test]
    fn custom_rates_ride_along_with_every_bundle() {
        let primary = StubSource::serving_latest(ProviderId::Backend, Err(down(ProviderId::Backend)));
        let official = StubSource::serving_latest(ProviderId::Official, Err(down(ProviderId::Official)));
        let p2p = StubSource::serving_latest(ProviderId::P2p, Err(down(ProviderId::P2p)));
        let custom = CustomRateConfig::new("Zelle", 37.0).expect("valid custom rate");

        let bundle = block_on(
            service(primary, official, p2p)
                .with_custom_rates(&[custom])
                .current_rates(),
        );

        let zelle = bundle.custom_rate("Zelle").expect("custom rate present");
        assert_eq!(zelle.price, 37.0);
        assert_eq!(zelle.previous_price, 37.0);
        assert_eq!(zelle.last_update, LastUpdate::UserDefined);
    }

    #[test]
    fn history_falls_back_to_backend_feed() {
        let external = StubSource::serving_history(
            ProviderId::OfficialHistory,
            Err(down(ProviderId::OfficialHistory)),
        );
        let backend = StubSource::serving_history(
            ProviderId::Backend,
            Ok(RawHistory::Backend(vec![BackendRateRecord {
                nombre: Some(String::from("BCV")),
                valor: Some(36.0),
                fecha: Some(String::from("2024-01-01T10:00")),
                ..BackendRateRecord::default()
            }])),
        );
        let service = RateService::from_sources(
            Vec::new(),
            Vec::new(),
            vec![external, backend],
            idle_backend(),
        );

        let report = block_on(service.history_report());

        assert_eq!(report.data.len(), 1);
        assert_eq!(report.data[0].usd, 36.0);
        assert_eq!(
            report.source_chain,
            vec![ProviderId::OfficialHistory, ProviderId::Backend]
        );
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn external_history_wins_when_it_answers() {
        let external = StubSource::serving_history(
            ProviderId::OfficialHistory,
            Ok(RawHistory::Official(vec![OfficialHistoryRow {
                date: Some(String::from("2024-01-02")),
                usd: Some(36.2),
                eur: Some(39.4),
            }])),
        );
        let backend = StubSource::serving_history(ProviderId::Backend, Ok(RawHistory::Backend(Vec::new())));
        let service = RateService::from_sources(
            Vec::new(),
            Vec::new(),
            vec![external, backend.clone()],
            idle_backend(),
        );

        let history = block_on(service.history());

        assert_eq!(history.len(), 1);
        assert_eq!(history[0].eur, 39.4);
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn history_total_failure_is_empty() {
        let backend = StubSource::serving_history(ProviderId::Backend, Err(down(ProviderId::Backend)));
        let service = RateService::from_sources(Vec::new(), Vec::new(), vec![backend], idle_backend());

        assert!(block_on(service.history()).is_empty());
    }

    #[test]
    fn advanced_history_normalizes_each_row() {
        let client = Arc::new(RecordingHttpClient::json(
            r#"{"success":true,"data":[{"id":1,"nombre":"USDT","valor":38.5,"previo":38.0,"fecha":"2024-01-02T10:00:00Z"},{"id":2,"nombre":"BCV","valor":36.1,"fecha":"2024-01-02T09:00:00Z"}],"pagination":{"total":2}}"#,
        ));
        let backend = Arc::new(BackendAdapter::new(
            client.clone(),
            Some("https://rates.example"),
            None,
            None,
        ));
        let service = RateService::from_sources(Vec::new(), Vec::new(), Vec::new(), backend);

        let page = block_on(service.usdt_history(DEFAULT_SERIES_LIMIT));

        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].absolute_change, 0.5);
        assert_eq!(page.pagination, Some(serde_json::json!({"total": 2})));
        assert_eq!(page.p2p_series().len(), 1);
        assert_eq!(
            client.recorded_requests()[0].full_url(),
            "https://rates.example/api/rates?nombre=USDT&limit=50&order=desc"
        );
    }

    #[test]
    fn advanced_history_failure_is_an_empty_page() {
        let page = block_on(
            RateService::from_sources(Vec::new(), Vec::new(), Vec::new(), idle_backend())
                .bcv_history(10),
        );
        assert_eq!(page, HistoryPage::empty());
    }

    #[test]
    fn backend_status_reports_online_flag_or_error() {
        let client = Arc::new(RecordingHttpClient::json(
            r#"{"status":"online","name":"rates-api","version":"2.1.0"}"#,
        ));
        let backend = Arc::new(BackendAdapter::new(client, Some("https://rates.example"), None, None));
        let status = block_on(
            RateService::from_sources(Vec::new(), Vec::new(), Vec::new(), backend)
                .check_backend_status(),
        );
        assert!(status.online);
        assert_eq!(status.version.as_deref(), Some("2.1.0"));

        let status = block_on(
            RateService::from_sources(Vec::new(), Vec::new(), Vec::new(), idle_backend())
                .check_backend_status(),
        );
        assert!(!status.online);
        assert!(status.error.is_some());
    }

    #[test]
    fn service_from_config_skips_unset_history_provider() {
        let config = RatesConfig::new().with_backend("https://rates.example", None);
        let service = RateService::with_http_client(&config, Arc::new(RecordingHttpClient::json("{}")))
            .expect("valid config");

        let ids: Vec<_> = service.history_chain.iter().map(|source| source.id()).collect();
        assert_eq!(ids, vec![ProviderId::Backend]);
    }
}
