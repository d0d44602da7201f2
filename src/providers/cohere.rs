use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::GenError;
use crate::message::ProviderId;
use crate::providers::classify::classify;
use crate::providers::envelope::{Envelope, extract};
use crate::providers::http::{HttpEngine, VendorCall};
use crate::providers::{
    AdapterRequest, ModelPolicy, ProviderAdapter, require_credential, resolve_model,
};

const BASE_URL: &str = "https://api.cohere.com/v1/chat";

pub const DEFAULT_MODEL: &str = "command-r";

pub const MODELS: &[&str] = &["command-r", "command-r-plus", "command-a-03-2025"];

pub struct CohereAdapter {
    engine: Arc<HttpEngine>,
    base_url: String,
}

impl CohereAdapter {
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
impl ProviderAdapter for CohereAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Cohere
    }

    async fn generate(
        &self,
        req: &AdapterRequest,
        token: &CancellationToken,
    ) -> Result<String, GenError> {
        let credential = require_credential(self.id(), &req.credential)?;
        let model = resolve_model(self.id(), ModelPolicy::Whitelist(MODELS), &req.model)?;

        // Cohere's chat API takes a single `message` string, not a list.
        let body = serde_json::json!({
            "model": model,
            "message": req.prompt,
            "temperature": 0.2,
        });
        let call = VendorCall::post_json(self.base_url.as_str(), body).bearer(&credential);

        let response = self.engine.dispatch(self.id(), call, token).await?;
        if !response.status.is_success() {
            return Err(classify(self.id(), &response, &[]));
        }
        extract(Envelope::TextField, self.id(), &response.body)
    }
}
