use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::GenError;
use crate::message::ProviderId;
use crate::providers::classify::{ErrorKind, ErrorRule, StatusMatch, classify};
use crate::providers::envelope::{Envelope, extract};
use crate::providers::http::{HttpEngine, VendorCall};
use crate::providers::{
    AdapterRequest, ModelPolicy, ProviderAdapter, require_credential, resolve_model,
};

const BASE_URL: &str = "https://api.anthropic.com/v1/messages";

const API_VERSION: &str = "2023-06-01";

/// The Messages API requires an explicit output cap.
const MAX_TOKENS: u32 = 1024;

pub const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";

pub const MODELS: &[&str] = &[
    "claude-sonnet-4-5",
    "claude-opus-4-1",
    "claude-3-5-haiku-latest",
    "claude-3-5-sonnet-latest",
];

// An out-of-credit account surfaces as a 400 mentioning the credit balance.
const RULES: &[ErrorRule] = &[ErrorRule {
    status: StatusMatch::Exact(400),
    needles: &["credit balance"],
    kind: ErrorKind::QuotaExceeded,
}];

pub struct AnthropicAdapter {
    engine: Arc<HttpEngine>,
    base_url: String,
}

impl AnthropicAdapter {
    pub fn new(engine: Arc<HttpEngine>) -> Self {
        Self::with_base_url(engine, BASE_URL)
    }

    pub fn with_base_url(engine: Arc<HttpEngine>, base_url: impl Into<String>) -> Self {
        Self {
            engine,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    async fn generate(
        &self,
        req: &AdapterRequest,
        token: &CancellationToken,
    ) -> Result<String, GenError> {
        let credential = require_credential(self.id(), &req.credential)?;
        let model = resolve_model(self.id(), ModelPolicy::Whitelist(MODELS), &req.model)?;

        let body = serde_json::json!({
            "model": model,
            "max_tokens": MAX_TOKENS,
            "messages": [{"role": "user", "content": req.prompt}],
        });
        // Anthropic authenticates with x-api-key, not a Bearer header.
        let call = VendorCall::post_json(self.base_url.as_str(), body)
            .header("x-api-key", credential)
            .header("anthropic-version", API_VERSION);

        let response = self.engine.dispatch(self.id(), call, token).await?;
        if !response.status.is_success() {
            return Err(classify(self.id(), &response, RULES));
        }
        extract(Envelope::MessageBlocks, self.id(), &response.body)
    }
}
