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

const BASE_URL: &str = "https://api.deepseek.com/chat/completions";

pub const DEFAULT_MODEL: &str = "deepseek-chat";

pub const MODELS: &[&str] = &["deepseek-chat", "deepseek-reasoner"];

// DeepSeek uses a literal 402 for an empty balance.
const RULES: &[ErrorRule] = &[ErrorRule {
    status: StatusMatch::Exact(402),
    needles: &[],
    kind: ErrorKind::QuotaExceeded,
}];

pub struct DeepSeekAdapter {
    engine: Arc<HttpEngine>,
    base_url: String,
}

impl DeepSeekAdapter {
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
impl ProviderAdapter for DeepSeekAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::DeepSeek
    }

    async fn generate(
        &self,
        req: &AdapterRequest,
        token: &CancellationToken,
    ) -> Result<String, GenError> {
        let credential = require_credential(self.id(), &req.credential)?;
        let model = resolve_model(
            self.id(),
            ModelPolicy::DefaultOnMiss {
                known: MODELS,
                default: DEFAULT_MODEL,
            },
            &req.model,
        )?;

        let call = VendorCall::post_json(
            self.base_url.as_str(),
            chat_completions_body(&model, &req.prompt),
        )
        .bearer(&credential);

        let response = self.engine.dispatch(self.id(), call, token).await?;
        if !response.status.is_success() {
            return Err(classify(self.id(), &response, RULES));
        }
        // deepseek-reasoner leaks its scratchpad into the text; the
        // normalizer strips it downstream.
        extract(Envelope::ChatChoices, self.id(), &response.body)
    }
}
