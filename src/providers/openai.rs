use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::GenError;
use crate::message::ProviderId;
use crate::providers::classify::{ErrorKind, ErrorRule, StatusMatch, classify};
use crate::providers::envelope::{Envelope, extract};
use crate::providers::http::{HttpEngine, VendorCall};
use crate::providers::{
    AdapterRequest, ModelPolicy, ProviderAdapter, chat_completions_body, require_credential,
    resolve_model,
};

const BASE_URL: &str = "https://api.openai.com/v1/chat/completions";

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub const MODELS: &[&str] = &[
    "gpt-4o",
    "gpt-4o-mini",
    "gpt-4.1",
    "gpt-4.1-mini",
    "gpt-4.1-nano",
    "o4-mini",
];

// OpenAI reports an exhausted account as a 429 with `insufficient_quota`,
// not a 402.
const RULES: &[ErrorRule] = &[ErrorRule {
    status: StatusMatch::Exact(429),
    needles: &["insufficient_quota", "exceeded your current quota"],
    kind: ErrorKind::QuotaExceeded,
}];

pub struct OpenAiAdapter {
    engine: Arc<HttpEngine>,
    base_url: String,
}

impl OpenAiAdapter {
    pub fn new(engine: Arc<HttpEngine>) -> Self {
        Self::with_base_url(engine, BASE_URL)
    }

    /// Point the adapter at a compatible gateway. Tests and corporate
    /// proxies only; the facade always uses the vendor endpoint.
    pub fn with_base_url(engine: Arc<HttpEngine>, base_url: impl Into<String>) -> Self {
        Self {
            engine,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    async fn generate(
        &self,
        req: &AdapterRequest,
        token: &CancellationToken,
    ) -> Result<String, GenError> {
        let credential = require_credential(self.id(), &req.credential)?;
        let model = resolve_model(self.id(), ModelPolicy::Whitelist(MODELS), &req.model)?;

        let call = VendorCall::post_json(
            self.base_url.as_str(),
            chat_completions_body(&model, &req.prompt),
        )
        .bearer(&credential);

        let response = self.engine.dispatch(self.id(), call, token).await?;
        if !response.status.is_success() {
            return Err(classify(self.id(), &response, RULES));
        }
        extract(Envelope::ChatChoices, self.id(), &response.body)
    }
}
