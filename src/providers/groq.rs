use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::GenError;
use crate::message::ProviderId;
use crate::providers::classify::classify;
use crate::providers::envelope::{Envelope, extract};
use crate::providers::http::{HttpEngine, VendorCall};
use crate::providers::{
    AdapterRequest, ModelPolicy, ProviderAdapter, chat_completions_body, require_credential,
    resolve_model,
};

const BASE_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

pub const MODELS: &[&str] = &[
    "llama-3.3-70b-versatile",
    "llama-3.1-8b-instant",
    "gemma2-9b-it",
];

pub struct GroqAdapter {
    engine: Arc<HttpEngine>,
    base_url: String,
}

impl GroqAdapter {
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
impl ProviderAdapter for GroqAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Groq
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
            return Err(classify(self.id(), &response, &[]));
        }
        extract(Envelope::ChatChoices, self.id(), &response.body)
    }
}
