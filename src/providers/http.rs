use std::sync::Mutex;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode};
use tokio_util::sync::CancellationToken;

use crate::error::GenError;
use crate::message::{ProviderId, RateLimitSnapshot};

const MAX_RESPONSE_BYTES: usize = 2 * 1024 * 1024; // 2MB

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// One vendor HTTP call, fully described. Adapters build these; the engine
/// owns transport, cancellation, and the rate-limit snapshot.
pub struct VendorCall {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<serde_json::Value>,
    pub timeout: Option<Duration>,
}

impl VendorCall {
    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body),
            timeout: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn bearer(self, credential: &str) -> Self {
        self.header("Authorization", format!("Bearer {credential}"))
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Status and body of a completed call, with the retry hint already pulled
/// off the headers. Classification happens downstream.
pub struct VendorResponse {
    pub status: StatusCode,
    pub retry_after: Option<Duration>,
    pub body: Vec<u8>,
}

/// Shared transport for every adapter and validator. Holds the single
/// reqwest client plus the best-effort rate-limit snapshot.
pub struct HttpEngine {
    client: Client,
    rate: Mutex<Option<RateLimitSnapshot>>,
}

impl Default for HttpEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpEngine {
    pub fn new() -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(4)
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            rate: Mutex::new(None),
        }
    }

    /// Issue one call bound to the shared token. If the token fires at any
    /// await point the result is `Cancelled`, regardless of what the
    /// transport would otherwise report.
    pub async fn dispatch(
        &self,
        provider: ProviderId,
        call: VendorCall,
        token: &CancellationToken,
    ) -> Result<VendorResponse, GenError> {
        if token.is_cancelled() {
            return Err(GenError::Cancelled);
        }

        let mut builder = self
            .client
            .request(call.method, &call.url)
            .timeout(call.timeout.unwrap_or(DEFAULT_TIMEOUT));
        for (name, value) in &call.headers {
            builder = builder.header(*name, value.as_str());
        }
        if let Some(body) = &call.body {
            builder = builder.json(body);
        }

        let response = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(GenError::Cancelled),
            res = builder.send() => res.map_err(|e| transport_error(provider, e, token))?,
        };

        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        self.record_rate_limit(provider, response.headers());

        let bytes = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(GenError::Cancelled),
            res = response.bytes() => res.map_err(|e| transport_error(provider, e, token))?,
        };

        if bytes.len() > MAX_RESPONSE_BYTES {
            return Err(GenError::Unknown {
                provider,
                status: Some(status.as_u16()),
                message: format!(
                    "response too large: {} bytes (max {MAX_RESPONSE_BYTES})",
                    bytes.len()
                ),
            });
        }

        Ok(VendorResponse {
            status,
            retry_after,
            body: bytes.to_vec(),
        })
    }

    /// Last observed rate-limit headers, if any call has produced some.
    /// Diagnostic only; returns None when another caller holds the lock.
    pub fn last_rate_limit(&self) -> Option<RateLimitSnapshot> {
        self.rate.try_lock().ok().and_then(|guard| guard.clone())
    }

    // Best-effort: skip the update if the lock is contended. Losing one
    // reading under overlapping calls is the documented trade.
    fn record_rate_limit(&self, provider: ProviderId, headers: &HeaderMap) {
        let limit = header_u64(headers, &["x-ratelimit-limit", "x-ratelimit-limit-requests"]);
        let remaining = header_u64(
            headers,
            &["x-ratelimit-remaining", "x-ratelimit-remaining-requests"],
        );
        let reset = ["x-ratelimit-reset", "x-ratelimit-reset-requests"]
            .iter()
            .find_map(|name| headers.get(*name))
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if limit.is_none() && remaining.is_none() && reset.is_none() {
            return;
        }

        if let Ok(mut guard) = self.rate.try_lock() {
            let snapshot = RateLimitSnapshot {
                provider,
                limit,
                remaining,
                reset,
            };
            if let Some(previous) = guard.as_ref()
                && previous.provider == provider
                && previous.remaining > snapshot.remaining
            {
                tracing::debug!(
                    %provider,
                    previous = ?previous.remaining,
                    current = ?snapshot.remaining,
                    "rate-limit headroom dropped"
                );
            }
            *guard = Some(snapshot);
        }
    }
}

fn header_u64(headers: &HeaderMap, names: &[&str]) -> Option<u64> {
    names
        .iter()
        .find_map(|name| headers.get(*name))
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Map a transport failure into the taxonomy. A fired token always wins.
fn transport_error(provider: ProviderId, err: reqwest::Error, token: &CancellationToken) -> GenError {
    if token.is_cancelled() {
        return GenError::Cancelled;
    }
    if err.is_timeout() || err.is_connect() {
        GenError::ServerUnavailable {
            provider,
            status: None,
            message: err.to_string(),
        }
    } else {
        GenError::Unknown {
            provider,
            status: None,
            message: err.to_string(),
        }
    }
}
