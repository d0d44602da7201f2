use std::sync::Arc;

use crate::coordinator::Coordinator;
use crate::error::GenError;
use crate::message::{
    CommitMessage, GenerationRequest, ProviderId, RateLimitSnapshot, ValidationResult,
};
use crate::normalize::normalize;
use crate::prompt::build_prompt;
use crate::providers::http::HttpEngine;
use crate::providers::{AdapterRequest, Endpoints, adapter_for};
use crate::validate;

/// The pipeline's front door. Owns the coordinator and shared transport;
/// everything a host (editor plugin, CLI) needs is `generate` and
/// `validate`.
pub struct Generator {
    engine: Arc<HttpEngine>,
    coordinator: Coordinator,
    endpoints: Endpoints,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new(Endpoints::default())
    }
}

impl Generator {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            engine: Arc::new(HttpEngine::new()),
            coordinator: Coordinator::new(),
            endpoints,
        }
    }

    /// Generate a commit message for one staged diff. Starting a new call
    /// cancels whatever was previously in flight; the superseded call
    /// resolves with `Cancelled`.
    pub async fn generate(&self, request: GenerationRequest) -> Result<CommitMessage, GenError> {
        if request.diff.trim().is_empty() {
            return Err(GenError::BadRequest {
                provider: request.provider,
                message: "the staged diff is empty".to_string(),
            });
        }

        let flight = self.coordinator.acquire();
        let prompt = build_prompt(&request.diff, &request.style, request.context.as_deref());
        let adapter = adapter_for(request.provider, Arc::clone(&self.engine), &self.endpoints);
        let adapter_request = AdapterRequest {
            model: request.model.clone(),
            credential: request.credential.clone(),
            prompt,
        };

        tracing::debug!(provider = %request.provider, model = %request.model, "generating");
        let outcome = adapter.generate(&adapter_request, flight.token()).await;
        self.coordinator.release(&flight);

        match outcome {
            Ok(raw) => Ok(normalize(&raw)),
            Err(err) => {
                if err.is_cancellation() {
                    tracing::debug!(provider = %request.provider, "generation superseded");
                } else {
                    tracing::warn!(provider = %request.provider, error = %err, "generation failed");
                }
                Err(err)
            }
        }
    }

    /// Probe a credential. Also single-flight: starting a validation cancels
    /// any outstanding generation, and vice versa.
    pub async fn validate(
        &self,
        provider: ProviderId,
        credential: Option<&str>,
    ) -> ValidationResult {
        let flight = self.coordinator.acquire();
        let result = validate::validate(
            &self.engine,
            provider,
            credential,
            &self.endpoints,
            flight.token(),
        )
        .await;
        self.coordinator.release(&flight);
        result
    }

    /// Last observed rate-limit headers across any provider call.
    /// Diagnostic only.
    pub fn last_rate_limit(&self) -> Option<RateLimitSnapshot> {
        self.engine.last_rate_limit()
    }
}
