use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The configured vendor backend. One adapter exists per variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenAi,
    Anthropic,
    Gemini,
    Mistral,
    Cohere,
    Groq,
    DeepSeek,
    Together,
    OpenRouter,
    Ollama,
    HuggingFace,
    Perplexity,
}

impl ProviderId {
    pub const ALL: [ProviderId; 12] = [
        ProviderId::OpenAi,
        ProviderId::Anthropic,
        ProviderId::Gemini,
        ProviderId::Mistral,
        ProviderId::Cohere,
        ProviderId::Groq,
        ProviderId::DeepSeek,
        ProviderId::Together,
        ProviderId::OpenRouter,
        ProviderId::Ollama,
        ProviderId::HuggingFace,
        ProviderId::Perplexity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Anthropic => "anthropic",
            ProviderId::Gemini => "gemini",
            ProviderId::Mistral => "mistral",
            ProviderId::Cohere => "cohere",
            ProviderId::Groq => "groq",
            ProviderId::DeepSeek => "deepseek",
            ProviderId::Together => "together",
            ProviderId::OpenRouter => "openrouter",
            ProviderId::Ollama => "ollama",
            ProviderId::HuggingFace => "huggingface",
            ProviderId::Perplexity => "perplexity",
        }
    }

    /// True when the vendor requires an API key for every call.
    /// Ollama is local-first and authenticates nothing.
    pub fn requires_credential(&self) -> bool {
        !matches!(self, ProviderId::Ollama)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        ProviderId::ALL
            .into_iter()
            .find(|p| p.as_str() == lower)
            .ok_or_else(|| format!("unknown provider: {s}"))
    }
}

/// How verbose the generated description should be.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Verbosity {
    Concise,
    #[default]
    Standard,
    Detailed,
}

/// Presentation options threaded into the prompt. These shape the
/// instruction text only; the normalizer enforces the hard limits.
#[derive(Clone, Debug)]
pub struct StyleOptions {
    /// Ask the model to include a `(scope)` in the subject line.
    pub include_scope: bool,
    /// Subject-length target passed to the model. The normalizer still
    /// truncates at 72 regardless of what the model does with this.
    pub max_subject: usize,
    pub verbosity: Verbosity,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            include_scope: false,
            max_subject: 72,
            verbosity: Verbosity::Standard,
        }
    }
}

/// One user action's worth of input. Built once, consumed once, discarded.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    /// The staged diff, embedded in the prompt verbatim. Must be non-empty.
    pub diff: String,
    pub provider: ProviderId,
    pub model: String,
    /// Opaque API key. `None` is only valid for providers that do not
    /// require one.
    pub credential: Option<String>,
    /// Free-form user context appended to the prompt after the diff.
    pub context: Option<String>,
    pub style: StyleOptions,
}

impl GenerationRequest {
    pub fn new(provider: ProviderId, model: impl Into<String>, diff: impl Into<String>) -> Self {
        Self {
            diff: diff.into(),
            provider,
            model: model.into(),
            credential: None,
            context: None,
            style: StyleOptions::default(),
        }
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_style(mut self, style: StyleOptions) -> Self {
        self.style = style;
        self
    }
}

/// The normalized output handed to the editor. `summary` always matches the
/// conventional-commit pattern and is at most 72 characters; `description`
/// is one or more `"- "` bullet lines.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommitMessage {
    pub summary: String,
    pub description: String,
}

impl CommitMessage {
    /// The full message as it would land in `git commit`.
    pub fn render(&self) -> String {
        format!("{}\n\n{}", self.summary, self.description)
    }
}

/// Outcome of a credential probe. Three states, not two: `success` with a
/// `warning` set means the key authenticated but the account has an
/// operational problem (e.g. no remaining credits).
#[derive(Clone, Debug, Default, Serialize)]
pub struct ValidationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub troubleshooting: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn ok_with_warning(warning: impl Into<String>) -> Self {
        Self {
            success: true,
            warning: Some(warning.into()),
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<String>, troubleshooting: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            troubleshooting: Some(troubleshooting.into()),
            ..Self::default()
        }
    }
}

/// Best-effort capture of the most recent `x-ratelimit-*` response headers.
/// Diagnostic only — nothing branches on it. Updated with `try_lock`, so an
/// overlapping request may skip one reading; that race is accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    pub provider: ProviderId,
    pub limit: Option<u64>,
    pub remaining: Option<u64>,
    /// Vendor-formatted reset time, kept verbatim (formats differ per vendor).
    pub reset: Option<String>,
}
