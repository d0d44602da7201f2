use std::time::Duration;

use thiserror::Error;

use crate::message::ProviderId;

#[derive(Debug, Error)]
pub enum GenError {
    #[error("no credential configured for {provider}")]
    MissingCredential { provider: ProviderId },

    #[error("unknown model for {provider}: {model}")]
    UnknownModel {
        provider: ProviderId,
        model: String,
        known: Vec<String>,
    },

    #[error("invalid credential for {provider}: {message}")]
    InvalidCredential {
        provider: ProviderId,
        message: String,
    },

    #[error("rate limited by {provider}")]
    RateLimited {
        provider: ProviderId,
        retry_after: Option<Duration>,
    },

    #[error("quota exceeded for {provider}: {message}")]
    QuotaExceeded {
        provider: ProviderId,
        message: String,
    },

    #[error("bad request to {provider}: {message}")]
    BadRequest {
        provider: ProviderId,
        message: String,
    },

    #[error("{provider} unavailable: {message}")]
    ServerUnavailable {
        provider: ProviderId,
        status: Option<u16>,
        message: String,
    },

    #[error("cancelled")]
    Cancelled,

    #[error("unexpected error from {provider}: {message}")]
    Unknown {
        provider: ProviderId,
        status: Option<u16>,
        message: String,
    },
}

impl GenError {
    /// Extract the provider from variants that carry one.
    pub fn provider(&self) -> Option<ProviderId> {
        match self {
            Self::MissingCredential { provider } => Some(*provider),
            Self::UnknownModel { provider, .. } => Some(*provider),
            Self::InvalidCredential { provider, .. } => Some(*provider),
            Self::RateLimited { provider, .. } => Some(*provider),
            Self::QuotaExceeded { provider, .. } => Some(*provider),
            Self::BadRequest { provider, .. } => Some(*provider),
            Self::ServerUnavailable { provider, .. } => Some(*provider),
            Self::Unknown { provider, .. } => Some(*provider),
            Self::Cancelled => None,
        }
    }

    /// True for failures where an identical retry may succeed. There is no
    /// automatic retry anywhere; this only shapes the message shown to the
    /// user, every retry is a fresh explicit action.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::ServerUnavailable { .. }
        )
    }

    /// True when the error means "superseded by a newer request" rather than
    /// a real failure. Callers should not surface these as notifications.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// A message safe to show in an editor notification. Never leaks URLs or
    /// raw response bodies beyond what the classifier already sanitized.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingCredential { provider } => {
                format!("no API key configured for {provider} — set one in the provider settings")
            }
            Self::UnknownModel {
                provider,
                model,
                known,
            } => {
                if known.is_empty() {
                    format!("{provider} does not recognize model {model:?}")
                } else {
                    format!(
                        "{provider} does not recognize model {model:?}. Known models: {}",
                        known.join(", ")
                    )
                }
            }
            Self::InvalidCredential { provider, .. } => {
                format!("{provider} rejected the API key — check the configured credential")
            }
            Self::RateLimited {
                provider,
                retry_after,
            } => match retry_after {
                Some(d) => format!(
                    "rate limited by {provider} — try again in {}s",
                    d.as_secs().max(1)
                ),
                None => format!("rate limited by {provider} — try again shortly"),
            },
            Self::QuotaExceeded { provider, .. } => {
                format!("{provider} reports an exhausted quota — check the account's billing")
            }
            Self::BadRequest { provider, message } => {
                format!("{provider} rejected the request: {message}")
            }
            Self::ServerUnavailable { provider, .. } => {
                format!("{provider} is unavailable — try again shortly")
            }
            Self::Cancelled => "generation superseded by a newer request".to_string(),
            Self::Unknown { provider, message, .. } => {
                format!("unexpected error from {provider}: {message}")
            }
        }
    }
}
