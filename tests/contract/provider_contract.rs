use ratefold_tests::{
    http, Arc, BackendAdapter, OfficialHistoryAdapter, OfficialRateAdapter, P2pAdapter,
    ProviderId, RateSource, RawHistory, RawLatest, SourceErrorKind,
};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn adapters_for(server: &MockServer, timeout_ms: Option<u64>) -> Vec<Arc<dyn RateSource>> {
    let uri = server.uri();
    vec![
        Arc::new(BackendAdapter::new(http(), Some(&uri), Some("backend-key"), timeout_ms)),
        Arc::new(OfficialRateAdapter::new(
            http(),
            Some(&format!("{uri}/official")),
            Some("official-key"),
            timeout_ms,
        )),
        Arc::new(P2pAdapter::new(http(), Some(&format!("{uri}/p2p")), timeout_ms)),
    ]
}

#[tokio::test]
async fn backend_latest_sends_bearer_and_returns_native_shape() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rates/latest"))
        .and(header("authorization", "Bearer backend-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "BCV": {"nombre": "BCV", "valor": 36.5, "previo": 36.0, "cambio": 0.3, "porcentaje_cambio": 0.8},
                "BCV_EUR": null,
                "USDT": {"nombre": "USDT", "valor": "38.10"}
            },
            "timestamp": "2024-01-05T12:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = BackendAdapter::new(http(), Some(&server.uri()), Some("backend-key"), None);
    let RawLatest::Backend(latest) = adapter.latest().await.expect("latest should succeed") else {
        panic!("backend adapter must return the backend shape");
    };

    let data = latest.data.expect("data present");
    assert_eq!(data.bcv.and_then(|record| record.cambio), Some(0.3));
    assert!(data.bcv_eur.is_none());
    assert_eq!(data.usdt.and_then(|record| record.valor), Some(38.10));
}

#[tokio::test]
async fn official_provider_uses_custom_key_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/official"))
        .and(header("x-dolarvzla-key", "official-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "current": {"usd": 40.0, "eur": 43.0, "date": "2024-01-05"},
            "previous": {"usd": 39.0, "eur": 42.0},
            "changePercentage": {"usd": 2.56, "eur": 2.38}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = OfficialRateAdapter::new(
        http(),
        Some(&format!("{}/official", server.uri())),
        Some("official-key"),
        None,
    );
    let RawLatest::Official(rates) = adapter.latest().await.expect("latest should succeed") else {
        panic!("official adapter must return the official shape");
    };
    assert_eq!(rates.current.usd, Some(40.0));
    assert_eq!(rates.current.date.as_deref(), Some("2024-01-05"));
}

#[tokio::test]
async fn p2p_provider_is_called_without_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p2p"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rate": 38.25})))
        .mount(&server)
        .await;

    let adapter = P2pAdapter::new(http(), Some(&format!("{}/p2p", server.uri())), None);
    adapter.latest().await.expect("latest should succeed");

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
    assert!(requests[0].headers.get("x-dolarvzla-key").is_none());
}

#[tokio::test]
async fn history_provider_rows_come_back_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history"))
        .and(header("x-dolarvzla-key", "official-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rates": [
                {"date": "2024-01-02", "usd": 36.2, "eur": 39.4},
                {"date": "2024-01-01", "usd": 36.0, "eur": 39.1}
            ]
        })))
        .mount(&server)
        .await;

    let adapter = OfficialHistoryAdapter::new(
        http(),
        Some(&format!("{}/history", server.uri())),
        Some("official-key"),
        None,
    );
    let RawHistory::Official(rows) = adapter.history().await.expect("history should succeed")
    else {
        panic!("history adapter must return official rows");
    };
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date.as_deref(), Some("2024-01-02"));
}

#[tokio::test]
async fn backend_history_feed_requests_latest_hundred_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rates"))
        .and(query_param("limit", "100"))
        .and(query_param("order", "desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{"nombre": "BCV", "valor": 36.0, "fecha": "2024-01-01T10:00"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = BackendAdapter::new(http(), Some(&server.uri()), None, None);
    let RawHistory::Backend(rows) = adapter.history().await.expect("history should succeed") else {
        panic!("backend adapter must return backend rows");
    };
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn non_success_status_is_a_status_failure_naming_the_source() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    for adapter in adapters_for(&server, None) {
        let error = adapter.latest().await.expect_err("503 must fail");
        assert_eq!(error.kind(), SourceErrorKind::Status, "source {}", adapter.id());
        assert!(error.message().contains(adapter.id().as_str()));
        assert!(error.message().contains("503"));
        assert!(error.retryable());
    }
}

#[tokio::test]
async fn malformed_bodies_are_schema_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    for adapter in adapters_for(&server, None) {
        let error = adapter.latest().await.expect_err("html must fail");
        assert_eq!(error.kind(), SourceErrorKind::Schema, "source {}", adapter.id());
        assert_eq!(error.code(), "source.schema");
    }
}

#[tokio::test]
async fn slow_upstream_hits_the_request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"rate": 38.0}))
                .set_delay(std::time::Duration::from_millis(1_500)),
        )
        .mount(&server)
        .await;

    let adapter = P2pAdapter::new(http(), Some(&format!("{}/p2p", server.uri())), Some(100));
    let error = adapter.latest().await.expect_err("timeout must fail");

    assert_eq!(error.kind(), SourceErrorKind::Timeout);
    assert_eq!(error.code(), "source.timeout");
    assert!(error.message().contains("timed out"));
}

#[tokio::test]
async fn unreachable_host_is_a_transport_failure() {
    let adapter = BackendAdapter::new(http(), Some("http://127.0.0.1:9"), None, Some(500));
    let error = adapter.latest().await.expect_err("closed port must fail");

    assert_eq!(error.kind(), SourceErrorKind::Transport);
    assert!(error.message().contains(ProviderId::Backend.as_str()));
}
