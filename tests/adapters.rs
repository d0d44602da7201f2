use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gitquill::GenError;
use gitquill::providers::http::HttpEngine;
use gitquill::providers::{
    AdapterRequest, ProviderAdapter, anthropic::AnthropicAdapter, gemini::GeminiAdapter,
    huggingface::HuggingFaceAdapter, mistral::MistralAdapter, ollama::OllamaAdapter,
    openai::OpenAiAdapter, openrouter::OpenRouterAdapter,
};

fn engine() -> Arc<HttpEngine> {
    Arc::new(HttpEngine::new())
}

fn request(model: &str) -> AdapterRequest {
    AdapterRequest {
        model: model.to_string(),
        credential: Some("test-key".to_string()),
        prompt: "write a commit message".to_string(),
    }
}

fn chat_body(content: &str) -> serde_json::Value {
    json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
}

#[tokio::test]
async fn openai_returns_raw_text_unmodified() {
    let server = MockServer::start().await;
    let raw = "**feat:** add dark mode\n- toggle added";
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(raw)))
        .mount(&server)
        .await;

    let adapter =
        OpenAiAdapter::with_base_url(engine(), format!("{}/v1/chat/completions", server.uri()));
    let text = adapter
        .generate(&request("gpt-4o-mini"), &CancellationToken::new())
        .await
        .unwrap();

    // Normalization is strictly downstream; the adapter must not touch the text.
    assert_eq!(text, raw);
}

#[tokio::test]
async fn openai_missing_credential() {
    let adapter = OpenAiAdapter::with_base_url(engine(), "http://127.0.0.1:9/unused");
    let mut req = request("gpt-4o-mini");
    req.credential = None;
    let err = adapter
        .generate(&req, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, GenError::MissingCredential { .. }));

    req.credential = Some("   ".to_string());
    let err = adapter
        .generate(&req, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, GenError::MissingCredential { .. }));
}

#[tokio::test]
async fn status_classification_table() {
    let cases: &[(u16, serde_json::Value, fn(&GenError) -> bool)] = &[
        (
            401,
            json!({"error": {"message": "Incorrect API key provided"}}),
            |e| matches!(e, GenError::InvalidCredential { .. }),
        ),
        (
            429,
            json!({"error": {"message": "Rate limit reached for requests"}}),
            |e| matches!(e, GenError::RateLimited { .. }),
        ),
        (
            429,
            json!({"error": {"message": "You exceeded your current quota", "code": "insufficient_quota"}}),
            |e| matches!(e, GenError::QuotaExceeded { .. }),
        ),
        (
            400,
            json!({"error": {"message": "max_tokens is invalid"}}),
            |e| matches!(e, GenError::BadRequest { .. }),
        ),
        (
            503,
            json!({"error": {"message": "The engine is currently overloaded"}}),
            |e| matches!(e, GenError::ServerUnavailable { .. }),
        ),
        (418, json!({"error": {"message": "teapot"}}), |e| {
            matches!(e, GenError::Unknown { .. })
        }),
    ];

    for (status, body, check) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(*status).set_body_json(body))
            .mount(&server)
            .await;

        let adapter = OpenAiAdapter::with_base_url(engine(), server.uri());
        let err = adapter
            .generate(&request("gpt-4o-mini"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(check(&err), "status {status}: got {err:?}");
    }
}

#[tokio::test]
async fn rate_limited_carries_retry_after_hint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "7")
                .set_body_json(json!({"error": {"message": "slow down"}})),
        )
        .mount(&server)
        .await;

    let adapter = OpenAiAdapter::with_base_url(engine(), server.uri());
    let err = adapter
        .generate(&request("gpt-4o-mini"), &CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        GenError::RateLimited { retry_after, .. } => {
            assert_eq!(retry_after, Some(Duration::from_secs(7)));
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

// The vendors genuinely disagree about unknown model ids. Whitelist vendors
// reject, substitution vendors silently fall back, open-registry vendors
// forward anything. This asymmetry is intentional and preserved.
#[tokio::test]
async fn model_policy_divergence_is_preserved() {
    // Whitelist: OpenAI rejects without touching the network.
    let adapter = OpenAiAdapter::with_base_url(engine(), "http://127.0.0.1:9/unused");
    let err = adapter
        .generate(&request("made-up-model"), &CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        GenError::UnknownModel { model, known, .. } => {
            assert_eq!(model, "made-up-model");
            assert!(!known.is_empty());
        }
        other => panic!("expected UnknownModel, got {other:?}"),
    }

    // Silent substitution: Mistral swaps in its default for the same input.
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"model": "mistral-small-latest"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("chore: x")))
        .expect(1)
        .mount(&server)
        .await;
    let adapter = MistralAdapter::with_base_url(engine(), server.uri());
    adapter
        .generate(&request("made-up-model"), &CancellationToken::new())
        .await
        .unwrap();

    // Open registry: OpenRouter forwards the id verbatim.
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"model": "made-up-model"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("chore: x")))
        .expect(1)
        .mount(&server)
        .await;
    let adapter = OpenRouterAdapter::with_base_url(engine(), server.uri());
    adapter
        .generate(&request("made-up-model"), &CancellationToken::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn anthropic_headers_and_block_extraction() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                {"type": "thinking", "text": "the diff touches auth"},
                {"type": "text", "text": "fix: expire sessions"}
            ]
        })))
        .mount(&server)
        .await;

    let adapter = AnthropicAdapter::with_base_url(engine(), server.uri());
    let text = adapter
        .generate(&request("claude-3-5-haiku-latest"), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(text, "fix: expire sessions");
}

#[tokio::test]
async fn gemini_puts_model_in_path_and_key_in_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "docs: update readme"}]}}]
        })))
        .mount(&server)
        .await;

    let adapter = GeminiAdapter::with_base_url(engine(), server.uri());
    let text = adapter
        .generate(&request("gemini-2.5-flash"), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(text, "docs: update readme");
}

#[tokio::test]
async fn ollama_concatenates_stream_fragments_without_credential() {
    let server = MockServer::start().await;
    let ndjson = "{\"response\":\"feat: \"}\n{\"response\":\"add cache\"}\n{\"done\":true}\n";
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ndjson, "application/x-ndjson"))
        .mount(&server)
        .await;

    let adapter = OllamaAdapter::new(engine(), server.uri());
    let mut req = request("llama3.1");
    req.credential = None;
    let text = adapter
        .generate(&req, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(text, "feat: add cache");
}

#[tokio::test]
async fn huggingface_generations_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/org/custom-model"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"generated_text": "test: cover edge cases"}])),
        )
        .mount(&server)
        .await;

    let adapter = HuggingFaceAdapter::with_base_url(engine(), server.uri());
    let text = adapter
        .generate(&request("org/custom-model"), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(text, "test: cover edge cases");
}

#[tokio::test]
async fn token_fired_mid_call_yields_cancelled() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_body("chore: never seen"))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let adapter = OpenAiAdapter::with_base_url(engine(), server.uri());
    let token = CancellationToken::new();
    let cancel = token.clone();
    let handle = tokio::spawn(async move {
        adapter
            .generate(&request("gpt-4o-mini"), &token)
            .await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let err = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("cancelled call must resolve promptly")
        .unwrap()
        .unwrap_err();
    assert!(matches!(err, GenError::Cancelled));
}

#[tokio::test]
async fn already_cancelled_token_skips_the_network() {
    let adapter = OpenAiAdapter::with_base_url(engine(), "http://127.0.0.1:9/unused");
    let token = CancellationToken::new();
    token.cancel();
    let err = adapter
        .generate(&request("gpt-4o-mini"), &token)
        .await
        .unwrap_err();
    assert!(matches!(err, GenError::Cancelled));
}
