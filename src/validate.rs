//! Per-vendor credential probes.
//!
//! A probe is one minimal request — a models-list where the vendor has one,
//! a one-token completion where it does not — mapped through a single shared
//! status policy. The guiding rule: never punish a valid key for a malformed
//! probe. A 404/405/415/422/429 means the credential authenticated and only
//! the probe's shape was rejected or throttled, so it still counts as valid.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::GenError;
use crate::message::{ProviderId, ValidationResult};
use crate::providers::Endpoints;
use crate::providers::classify::error_message;
use crate::providers::http::{HttpEngine, VendorCall};

const PROBE_TIMEOUT: Duration = Duration::from_secs(8);

const BILLING_WORDS: &[&str] = &["billing", "credit", "quota", "payment", "insufficient"];

/// Validate a credential with one bounded probe under the shared token.
pub async fn validate(
    engine: &HttpEngine,
    provider: ProviderId,
    credential: Option<&str>,
    endpoints: &Endpoints,
    token: &CancellationToken,
) -> ValidationResult {
    let credential = credential.map(str::trim).filter(|c| !c.is_empty());
    if credential.is_none() && provider.requires_credential() {
        return ValidationResult::failed(
            format!("no API key configured for {provider}"),
            troubleshooting(provider),
        );
    }

    let call = probe_call(provider, credential.unwrap_or_default(), endpoints);
    run_probe(engine, provider, call, token).await
}

/// Issue a prepared probe and map its outcome through the shared policy.
/// Exposed separately so the policy can be exercised against a stub server.
pub async fn run_probe(
    engine: &HttpEngine,
    provider: ProviderId,
    call: VendorCall,
    token: &CancellationToken,
) -> ValidationResult {
    let response = match engine.dispatch(provider, call.timeout(PROBE_TIMEOUT), token).await {
        Ok(response) => response,
        Err(GenError::Cancelled) => {
            return ValidationResult {
                success: false,
                error: Some("validation superseded by a newer request".to_string()),
                ..Default::default()
            };
        }
        Err(err) => {
            return ValidationResult::failed(err.user_message(), troubleshooting(provider));
        }
    };

    let status = response.status.as_u16();
    let message = error_message(&response.body);

    match status {
        200..=299 => ValidationResult::ok(),
        401 => ValidationResult::failed(
            format!("{provider} rejected the API key"),
            troubleshooting(provider),
        ),
        402 | 403 if has_billing_wording(&message) => ValidationResult::ok_with_warning(format!(
            "credential is valid but {provider} reports an account problem: {message}"
        )),
        // The key authenticated; only the probe's request shape was rejected
        // or throttled.
        404 | 405 | 415 | 422 | 429 => ValidationResult::ok(),
        _ => ValidationResult::failed(
            format!("{provider} returned an unexpected status {status}: {message}"),
            troubleshooting(provider),
        ),
    }
}

fn has_billing_wording(message: &str) -> bool {
    let lower = message.to_lowercase();
    BILLING_WORDS.iter().any(|w| lower.contains(w))
}

fn probe_call(provider: ProviderId, credential: &str, endpoints: &Endpoints) -> VendorCall {
    match provider {
        ProviderId::OpenAi => {
            VendorCall::get("https://api.openai.com/v1/models").bearer(credential)
        }
        ProviderId::Anthropic => VendorCall::get("https://api.anthropic.com/v1/models")
            .header("x-api-key", credential)
            .header("anthropic-version", "2023-06-01"),
        ProviderId::Gemini => VendorCall::get(format!(
            "https://generativelanguage.googleapis.com/v1beta/models?key={credential}"
        )),
        ProviderId::Mistral => {
            VendorCall::get("https://api.mistral.ai/v1/models").bearer(credential)
        }
        ProviderId::Cohere => {
            VendorCall::get("https://api.cohere.com/v1/models").bearer(credential)
        }
        ProviderId::Groq => {
            VendorCall::get("https://api.groq.com/openai/v1/models").bearer(credential)
        }
        ProviderId::DeepSeek => {
            VendorCall::get("https://api.deepseek.com/models").bearer(credential)
        }
        ProviderId::Together => {
            VendorCall::get("https://api.together.xyz/v1/models").bearer(credential)
        }
        ProviderId::OpenRouter => {
            VendorCall::get("https://openrouter.ai/api/v1/key").bearer(credential)
        }
        ProviderId::Ollama => VendorCall::get(format!(
            "{}/api/tags",
            endpoints.ollama_base_url.trim_end_matches('/')
        )),
        ProviderId::HuggingFace => {
            VendorCall::get("https://huggingface.co/api/whoami-v2").bearer(credential)
        }
        // No models endpoint; a one-token completion is the cheapest probe.
        ProviderId::Perplexity => VendorCall::post_json(
            "https://api.perplexity.ai/chat/completions",
            serde_json::json!({
                "model": "sonar",
                "messages": [{"role": "user", "content": "ping"}],
                "max_tokens": 1,
            }),
        )
        .bearer(credential),
    }
}

fn troubleshooting(provider: ProviderId) -> &'static str {
    match provider {
        ProviderId::OpenAi => "Create a key at https://platform.openai.com/api-keys",
        ProviderId::Anthropic => "Create a key at https://console.anthropic.com/settings/keys",
        ProviderId::Gemini => "Create a key at https://aistudio.google.com/app/apikey",
        ProviderId::Mistral => "Create a key at https://console.mistral.ai/api-keys",
        ProviderId::Cohere => "Create a key at https://dashboard.cohere.com/api-keys",
        ProviderId::Groq => "Create a key at https://console.groq.com/keys",
        ProviderId::DeepSeek => "Create a key at https://platform.deepseek.com/api_keys",
        ProviderId::Together => "Create a key at https://api.together.xyz/settings/api-keys",
        ProviderId::OpenRouter => "Create a key at https://openrouter.ai/keys",
        ProviderId::Ollama => {
            "Check that the Ollama daemon is running and the base URL is reachable"
        }
        ProviderId::HuggingFace => "Create a token at https://huggingface.co/settings/tokens",
        ProviderId::Perplexity => "Create a key at https://www.perplexity.ai/settings/api",
    }
}
