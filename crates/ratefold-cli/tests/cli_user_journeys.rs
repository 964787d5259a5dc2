//! User journeys through the `ratefold` binary against mocked upstreams.

use std::process::Output;

use serde_json::{json, Value};
use tokio::process::Command;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn ratefold(server: &MockServer, args: &[&str]) -> Output {
    let uri = server.uri();
    Command::new(env!("CARGO_BIN_EXE_ratefold"))
        .args(args)
        .env_clear()
        .env("RATEFOLD_BACKEND_URL", &uri)
        .env("RATEFOLD_OFFICIAL_URL", format!("{uri}/official"))
        .env("RATEFOLD_P2P_URL", format!("{uri}/p2p"))
        .env("RATEFOLD_TIMEOUT_MS", "2000")
        .env("RUST_LOG", "off")
        .output()
        .await
        .expect("ratefold binary should start")
}

fn envelope(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should hold one JSON envelope")
}

#[tokio::test]
async fn user_gets_backend_rates_and_a_clean_exit() {
    // Given: the backend is healthy
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rates/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"BCV": {"valor": 36.5, "previo": 36.0}}
        })))
        .mount(&server)
        .await;

    // When: they ask for current rates
    let output = ratefold(&server, &["rates"]).await;

    // Then: the backend answer is printed and the process succeeds
    assert_eq!(output.status.code(), Some(0));
    let body = envelope(&output);
    assert_eq!(body["data"]["bcv_usd"]["price"], 36.5);
    assert_eq!(body["meta"]["source_chain"], json!(["backend"]));
    assert!(body.get("errors").is_none());
}

#[tokio::test]
async fn user_is_told_when_every_source_failed() {
    // Given: every upstream is down
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    // When: they ask for current rates
    let output = ratefold(&server, &["rates"]).await;

    // Then: zero-filled defaults are still printed, but the exit code says so
    assert_eq!(output.status.code(), Some(3));
    let body = envelope(&output);
    assert_eq!(body["data"]["bcv_usd"]["price"], 0.0);
    assert_eq!(body["errors"].as_array().map(Vec::len), Some(3));
    assert_eq!(
        body["meta"]["warnings"],
        json!(["all sources failed; data holds zero-filled defaults"])
    );
}

#[tokio::test]
async fn bad_history_bounds_fail_without_calling_the_backend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": []})))
        .expect(0)
        .mount(&server)
        .await;

    let output = ratefold(&server, &["history-page", "--p2p-only", "--from", "last week"]).await;

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--from"));
}
