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

const BASE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

// OpenRouter reports an empty balance as a 402 with "credits".
const RULES: &[ErrorRule] = &[ErrorRule {
    status: StatusMatch::Exact(402),
    needles: &[],
    kind: ErrorKind::QuotaExceeded,
}];

pub struct OpenRouterAdapter {
    engine: Arc<HttpEngine>,
    base_url: String,
}

impl OpenRouterAdapter {
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
impl ProviderAdapter for OpenRouterAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::OpenRouter
    }

    async fn generate(
        &self,
        req: &AdapterRequest,
        token: &CancellationToken,
    ) -> Result<String, GenError> {
        let credential = require_credential(self.id(), &req.credential)?;
        // The model catalog is an open registry; any id is forwarded as-is
        // and the router decides whether it exists.
        let model = resolve_model(self.id(), ModelPolicy::Open, &req.model)?;

        let call = VendorCall::post_json(
            self.base_url.as_str(),
            chat_completions_body(&model, &req.prompt),
        )
        .bearer(&credential)
        .header("HTTP-Referer", "https://github.com/gitquill/gitquill")
        .header("X-Title", "gitquill");

        let response = self.engine.dispatch(self.id(), call, token).await?;
        if !response.status.is_success() {
            return Err(classify(self.id(), &response, RULES));
        }
        extract(Envelope::ChatChoices, self.id(), &response.body)
    }
}
