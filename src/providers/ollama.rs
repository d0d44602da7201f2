use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::GenError;
use crate::message::ProviderId;
use crate::providers::classify::{ErrorKind, ErrorRule, StatusMatch, classify};
use crate::providers::envelope::{Envelope, extract};
use crate::providers::http::{HttpEngine, VendorCall};
use crate::providers::{AdapterRequest, ModelPolicy, ProviderAdapter, resolve_model};

/// The only user-configurable base URL in the pipeline: Ollama is
/// self-hosted, so the default points at the local daemon.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

pub const DEFAULT_MODEL: &str = "llama3.1";

// A pull-less model shows up as a 404 naming the model.
const RULES: &[ErrorRule] = &[ErrorRule {
    status: StatusMatch::Exact(404),
    needles: &["model"],
    kind: ErrorKind::BadRequest,
}];

pub struct OllamaAdapter {
    engine: Arc<HttpEngine>,
    base_url: String,
}

impl OllamaAdapter {
    pub fn new(engine: Arc<HttpEngine>, base_url: String) -> Self {
        Self { engine, base_url }
    }
}

#[async_trait]
impl ProviderAdapter for OllamaAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Ollama
    }

    async fn generate(
        &self,
        req: &AdapterRequest,
        token: &CancellationToken,
    ) -> Result<String, GenError> {
        // No credential: the daemon is local and unauthenticated.
        let model = resolve_model(self.id(), ModelPolicy::Open, &req.model)?;

        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": model,
            "prompt": req.prompt,
        });
        let call = VendorCall::post_json(url, body);

        let response = self.engine.dispatch(self.id(), call, token).await?;
        if !response.status.is_success() {
            return Err(classify(self.id(), &response, RULES));
        }
        // The daemon streams NDJSON fragments by default; the envelope
        // mapping concatenates them.
        extract(Envelope::NdjsonFragments, self.id(), &response.body)
    }
}
