pub mod anthropic;
pub mod classify;
pub mod cohere;
pub mod deepseek;
pub mod envelope;
pub mod gemini;
pub mod groq;
pub mod http;
pub mod huggingface;
pub mod mistral;
pub mod ollama;
pub mod openai;
pub mod openrouter;
pub mod perplexity;
pub mod together;

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::GenError;
use crate::message::ProviderId;
use crate::providers::http::HttpEngine;

/// What an adapter needs for one generation. The prompt is already built;
/// adapters only wrap it in their vendor's request schema.
#[derive(Clone, Debug)]
pub struct AdapterRequest {
    pub model: String,
    pub credential: Option<String>,
    pub prompt: String,
}

/// The uniform per-vendor generation contract. Adding a vendor means adding
/// one implementation; nothing else in the pipeline changes.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Produce raw model text for the prompt, or a taxonomy error. The
    /// returned text is untouched — normalization is strictly downstream.
    async fn generate(
        &self,
        req: &AdapterRequest,
        token: &CancellationToken,
    ) -> Result<String, GenError>;
}

/// How a vendor treats a model id it does not recognize. The vendors
/// genuinely diverge here and the divergence is preserved on purpose.
#[derive(Clone, Copy, Debug)]
pub enum ModelPolicy {
    /// Reject with `UnknownModel`.
    Whitelist(&'static [&'static str]),
    /// Silently substitute the default and log the substitution.
    DefaultOnMiss {
        known: &'static [&'static str],
        default: &'static str,
    },
    /// Open registry: any non-empty id is passed through.
    Open,
}

pub(crate) fn resolve_model(
    provider: ProviderId,
    policy: ModelPolicy,
    requested: &str,
) -> Result<String, GenError> {
    let requested = requested.trim();
    match policy {
        ModelPolicy::Whitelist(known) => {
            if known.contains(&requested) {
                Ok(requested.to_string())
            } else {
                Err(GenError::UnknownModel {
                    provider,
                    model: requested.to_string(),
                    known: known.iter().map(|m| m.to_string()).collect(),
                })
            }
        }
        ModelPolicy::DefaultOnMiss { known, default } => {
            if known.contains(&requested) {
                Ok(requested.to_string())
            } else {
                tracing::debug!(%provider, requested, default, "substituting default model");
                Ok(default.to_string())
            }
        }
        ModelPolicy::Open => {
            if requested.is_empty() {
                Err(GenError::UnknownModel {
                    provider,
                    model: String::new(),
                    known: Vec::new(),
                })
            } else {
                Ok(requested.to_string())
            }
        }
    }
}

pub(crate) fn require_credential(
    provider: ProviderId,
    credential: &Option<String>,
) -> Result<String, GenError> {
    credential
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .ok_or(GenError::MissingCredential { provider })
}

/// The default model per provider, used by callers that leave the model
/// unset and by the silent-substitution vendors.
pub fn default_model(provider: ProviderId) -> &'static str {
    match provider {
        ProviderId::OpenAi => openai::DEFAULT_MODEL,
        ProviderId::Anthropic => anthropic::DEFAULT_MODEL,
        ProviderId::Gemini => gemini::DEFAULT_MODEL,
        ProviderId::Mistral => mistral::DEFAULT_MODEL,
        ProviderId::Cohere => cohere::DEFAULT_MODEL,
        ProviderId::Groq => groq::DEFAULT_MODEL,
        ProviderId::DeepSeek => deepseek::DEFAULT_MODEL,
        ProviderId::Together => together::DEFAULT_MODEL,
        ProviderId::OpenRouter => openrouter::DEFAULT_MODEL,
        ProviderId::Ollama => ollama::DEFAULT_MODEL,
        ProviderId::HuggingFace => huggingface::DEFAULT_MODEL,
        ProviderId::Perplexity => perplexity::DEFAULT_MODEL,
    }
}

/// Per-install endpoint overrides. Only Ollama is user-configurable (it is
/// self-hosted); every other base URL is a fixed vendor constant.
#[derive(Clone, Debug)]
pub struct Endpoints {
    pub ollama_base_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            ollama_base_url: ollama::DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Select the adapter for a provider. Adapters are cheap shells over the
/// shared engine, built per call.
pub fn adapter_for(
    provider: ProviderId,
    engine: Arc<HttpEngine>,
    endpoints: &Endpoints,
) -> Box<dyn ProviderAdapter> {
    match provider {
        ProviderId::OpenAi => Box::new(openai::OpenAiAdapter::new(engine)),
        ProviderId::Anthropic => Box::new(anthropic::AnthropicAdapter::new(engine)),
        ProviderId::Gemini => Box::new(gemini::GeminiAdapter::new(engine)),
        ProviderId::Mistral => Box::new(mistral::MistralAdapter::new(engine)),
        ProviderId::Cohere => Box::new(cohere::CohereAdapter::new(engine)),
        ProviderId::Groq => Box::new(groq::GroqAdapter::new(engine)),
        ProviderId::DeepSeek => Box::new(deepseek::DeepSeekAdapter::new(engine)),
        ProviderId::Together => Box::new(together::TogetherAdapter::new(engine)),
        ProviderId::OpenRouter => Box::new(openrouter::OpenRouterAdapter::new(engine)),
        ProviderId::Ollama => Box::new(ollama::OllamaAdapter::new(
            engine,
            endpoints.ollama_base_url.clone(),
        )),
        ProviderId::HuggingFace => Box::new(huggingface::HuggingFaceAdapter::new(engine)),
        ProviderId::Perplexity => Box::new(perplexity::PerplexityAdapter::new(engine)),
    }
}

/// Request body for the OpenAI-compatible chat-completions dialect, which
/// over half the vendors speak.
pub(crate) fn chat_completions_body(model: &str, prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "messages": [{"role": "user", "content": prompt}],
        "temperature": 0.2,
    })
}
