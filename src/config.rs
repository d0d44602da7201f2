use std::env;
use std::str::FromStr;

use crate::message::ProviderId;
use crate::providers::{Endpoints, default_model, ollama};

/// Environment-driven configuration for the CLI. Hosts embedding the
/// library pass credentials in the request instead.
#[derive(Clone, Debug)]
pub struct Config {
    pub provider: ProviderId,
    pub model: String,
    pub credential: Option<String>,
    pub endpoints: Endpoints,
}

impl Config {
    pub fn from_env() -> Self {
        let provider = env::var("GITQUILL_PROVIDER")
            .ok()
            .and_then(|v| ProviderId::from_str(&v).ok())
            .unwrap_or(ProviderId::OpenAi);

        let model = env::var("GITQUILL_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| default_model(provider).to_string());

        let credential = credential_env_var(provider).and_then(|name| {
            let value = env::var(name).ok().filter(|v| !v.trim().is_empty());
            if value.is_none() {
                tracing::warn!("{name} not set — {provider} calls will fail");
            }
            value
        });

        let endpoints = Endpoints {
            ollama_base_url: env::var("OLLAMA_BASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| ollama::DEFAULT_BASE_URL.to_string()),
        };

        Config {
            provider,
            model,
            credential,
            endpoints,
        }
    }
}

/// The conventional env var for each vendor's key. Ollama has none.
pub fn credential_env_var(provider: ProviderId) -> Option<&'static str> {
    match provider {
        ProviderId::OpenAi => Some("OPENAI_API_KEY"),
        ProviderId::Anthropic => Some("ANTHROPIC_API_KEY"),
        ProviderId::Gemini => Some("GEMINI_API_KEY"),
        ProviderId::Mistral => Some("MISTRAL_API_KEY"),
        ProviderId::Cohere => Some("COHERE_API_KEY"),
        ProviderId::Groq => Some("GROQ_API_KEY"),
        ProviderId::DeepSeek => Some("DEEPSEEK_API_KEY"),
        ProviderId::Together => Some("TOGETHER_API_KEY"),
        ProviderId::OpenRouter => Some("OPENROUTER_API_KEY"),
        ProviderId::Ollama => None,
        ProviderId::HuggingFace => Some("HF_TOKEN"),
        ProviderId::Perplexity => Some("PERPLEXITY_API_KEY"),
    }
}
