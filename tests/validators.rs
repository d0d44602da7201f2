use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gitquill::ProviderId;
use gitquill::providers::Endpoints;
use gitquill::providers::http::{HttpEngine, VendorCall};
use gitquill::validate::{run_probe, validate};

async fn probe_status(status: u16, body: serde_json::Value) -> gitquill::ValidationResult {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(&server)
        .await;

    let engine = HttpEngine::new();
    run_probe(
        &engine,
        ProviderId::OpenAi,
        VendorCall::get(server.uri()).bearer("test-key"),
        &CancellationToken::new(),
    )
    .await
}

#[tokio::test]
async fn ok_status_is_valid() {
    let result = probe_status(200, json!({"data": []})).await;
    assert!(result.success);
    assert!(result.warning.is_none());
    assert!(result.error.is_none());
}

#[tokio::test]
async fn unauthorized_is_invalid_with_troubleshooting() {
    let result = probe_status(401, json!({"error": {"message": "bad key"}})).await;
    assert!(!result.success);
    assert!(result.error.is_some());
    assert!(result.troubleshooting.is_some());
}

// Throttling is not an invalid credential: the key authenticated, the probe
// just got rate limited.
#[tokio::test]
async fn rate_limited_probe_still_counts_as_valid() {
    let result = probe_status(429, json!({"error": {"message": "too many requests"}})).await;
    assert!(result.success);
    assert!(result.warning.is_none());
}

#[tokio::test]
async fn probe_shape_rejections_count_as_valid() {
    for status in [404u16, 405, 415, 422] {
        let result = probe_status(status, json!({"error": {"message": "bad probe"}})).await;
        assert!(result.success, "status {status} should not invalidate the key");
    }
}

#[tokio::test]
async fn billing_forbidden_is_valid_with_warning() {
    let result = probe_status(
        403,
        json!({"error": {"message": "Your account has a billing hold"}}),
    )
    .await;
    assert!(result.success);
    let warning = result.warning.expect("expected a warning");
    assert!(warning.contains("billing"));
}

#[tokio::test]
async fn payment_required_is_valid_with_warning() {
    let result = probe_status(
        402,
        json!({"error": {"message": "insufficient credit balance"}}),
    )
    .await;
    assert!(result.success);
    assert!(result.warning.is_some());
}

// A non-billing 403 errs toward "invalid" rather than showing a false
// "configured" indicator.
#[tokio::test]
async fn plain_forbidden_is_a_failure() {
    let result = probe_status(403, json!({"error": {"message": "origin not allowed"}})).await;
    assert!(!result.success);
}

#[tokio::test]
async fn unrecognized_status_is_a_failure() {
    let result = probe_status(500, json!({"error": {"message": "boom"}})).await;
    assert!(!result.success);
    assert!(result.error.is_some());
}

#[tokio::test]
async fn missing_credential_fails_without_network() {
    let engine = HttpEngine::new();
    let result = validate(
        &engine,
        ProviderId::OpenAi,
        None,
        &Endpoints::default(),
        &CancellationToken::new(),
    )
    .await;
    assert!(!result.success);
    assert!(result.error.unwrap().contains("openai"));
}

#[tokio::test]
async fn ollama_probe_needs_no_credential() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": []})))
        .mount(&server)
        .await;

    let engine = HttpEngine::new();
    let endpoints = Endpoints {
        ollama_base_url: server.uri(),
    };
    let result = validate(
        &engine,
        ProviderId::Ollama,
        None,
        &endpoints,
        &CancellationToken::new(),
    )
    .await;
    assert!(result.success);
}

#[tokio::test]
async fn unreachable_daemon_is_a_failure_with_hint() {
    let engine = HttpEngine::new();
    let endpoints = Endpoints {
        // Port 9 (discard) refuses connections.
        ollama_base_url: "http://127.0.0.1:9".to_string(),
    };
    let result = validate(
        &engine,
        ProviderId::Ollama,
        None,
        &endpoints,
        &CancellationToken::new(),
    )
    .await;
    assert!(!result.success);
    assert!(result.troubleshooting.is_some());
}
