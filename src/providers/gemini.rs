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

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

pub const MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.5-pro", "gemini-2.0-flash"];

// Gemini rejects a malformed key with a 400, not a 401.
const RULES: &[ErrorRule] = &[
    ErrorRule {
        status: StatusMatch::Exact(400),
        needles: &["api key not valid", "api_key_invalid"],
        kind: ErrorKind::InvalidCredential,
    },
    ErrorRule {
        status: StatusMatch::Exact(429),
        needles: &["exceeded your current quota", "billing"],
        kind: ErrorKind::QuotaExceeded,
    },
];

pub struct GeminiAdapter {
    engine: Arc<HttpEngine>,
    base_url: String,
}

impl GeminiAdapter {
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
impl ProviderAdapter for GeminiAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    async fn generate(
        &self,
        req: &AdapterRequest,
        token: &CancellationToken,
    ) -> Result<String, GenError> {
        let credential = require_credential(self.id(), &req.credential)?;
        let model = resolve_model(self.id(), ModelPolicy::Whitelist(MODELS), &req.model)?;

        // The model lives in the path and the key in a query parameter.
        let url = format!(
            "{}/models/{model}:generateContent?key={credential}",
            self.base_url
        );
        let body = serde_json::json!({
            "contents": [{"parts": [{"text": req.prompt}]}],
            "generationConfig": {"temperature": 0.2},
        });
        let call = VendorCall::post_json(url, body);

        let response = self.engine.dispatch(self.id(), call, token).await?;
        if !response.status.is_success() {
            return Err(classify(self.id(), &response, RULES));
        }
        extract(Envelope::Candidates, self.id(), &response.body)
    }
}
