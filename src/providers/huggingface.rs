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

const BASE_URL: &str = "https://api-inference.huggingface.co/models";

pub const DEFAULT_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.3";

const MAX_NEW_TOKENS: u32 = 512;

// A cold model returns 503 with an estimated load time; that is transient,
// not an outage of ours to explain differently.
const RULES: &[ErrorRule] = &[ErrorRule {
    status: StatusMatch::Exact(503),
    needles: &["loading"],
    kind: ErrorKind::ServerUnavailable,
}];

pub struct HuggingFaceAdapter {
    engine: Arc<HttpEngine>,
    base_url: String,
}

impl HuggingFaceAdapter {
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
impl ProviderAdapter for HuggingFaceAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::HuggingFace
    }

    async fn generate(
        &self,
        req: &AdapterRequest,
        token: &CancellationToken,
    ) -> Result<String, GenError> {
        let credential = require_credential(self.id(), &req.credential)?;
        // Any hub repo id is a valid model reference.
        let model = resolve_model(self.id(), ModelPolicy::Open, &req.model)?;

        let url = format!("{}/{model}", self.base_url);
        let body = serde_json::json!({
            "inputs": req.prompt,
            "parameters": {
                "max_new_tokens": MAX_NEW_TOKENS,
                "return_full_text": false,
            },
        });
        let call = VendorCall::post_json(url, body).bearer(&credential);

        let response = self.engine.dispatch(self.id(), call, token).await?;
        if !response.status.is_success() {
            return Err(classify(self.id(), &response, RULES));
        }
        extract(Envelope::Generations, self.id(), &response.body)
    }
}
