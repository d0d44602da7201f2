//! Generic HTTP-error classifier driven by per-vendor rule tables.
//!
//! Every vendor disagrees about which status means what, but the differences
//! fit in a handful of declarative rules: a status match, optional message
//! substrings, and the resulting error kind. Vendor tables are consulted
//! first, then the shared defaults.

use serde_json::Value;

use crate::error::GenError;
use crate::message::ProviderId;
use crate::providers::http::VendorResponse;

const MAX_MESSAGE_CHARS: usize = 300;

#[derive(Clone, Copy, Debug)]
pub enum StatusMatch {
    Exact(u16),
    Range(u16, u16),
    Any,
}

impl StatusMatch {
    fn matches(&self, status: u16) -> bool {
        match self {
            StatusMatch::Exact(s) => status == *s,
            StatusMatch::Range(lo, hi) => (*lo..=*hi).contains(&status),
            StatusMatch::Any => true,
        }
    }
}

/// What a matched rule classifies into. Mirrors the non-cancellation half of
/// the error taxonomy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidCredential,
    RateLimited,
    QuotaExceeded,
    BadRequest,
    ServerUnavailable,
    Unknown,
}

/// One classification rule. `needles` is an any-of list matched against the
/// lowercased vendor error message; empty means status alone decides.
#[derive(Clone, Copy, Debug)]
pub struct ErrorRule {
    pub status: StatusMatch,
    pub needles: &'static [&'static str],
    pub kind: ErrorKind,
}

/// Shared fallback table. Order matters: the billing-flavored 429 rule must
/// run before the plain 429 rule.
const DEFAULT_RULES: &[ErrorRule] = &[
    ErrorRule {
        status: StatusMatch::Exact(401),
        needles: &[],
        kind: ErrorKind::InvalidCredential,
    },
    ErrorRule {
        status: StatusMatch::Exact(402),
        needles: &[],
        kind: ErrorKind::QuotaExceeded,
    },
    ErrorRule {
        status: StatusMatch::Exact(429),
        needles: &["quota", "billing", "credit", "insufficient"],
        kind: ErrorKind::QuotaExceeded,
    },
    ErrorRule {
        status: StatusMatch::Exact(429),
        needles: &[],
        kind: ErrorKind::RateLimited,
    },
    ErrorRule {
        status: StatusMatch::Exact(403),
        needles: &[],
        kind: ErrorKind::InvalidCredential,
    },
    ErrorRule {
        status: StatusMatch::Exact(400),
        needles: &[],
        kind: ErrorKind::BadRequest,
    },
    ErrorRule {
        status: StatusMatch::Exact(422),
        needles: &[],
        kind: ErrorKind::BadRequest,
    },
    ErrorRule {
        status: StatusMatch::Range(500, 599),
        needles: &[],
        kind: ErrorKind::ServerUnavailable,
    },
];

/// Classify a non-2xx response into exactly one taxonomy error, carrying the
/// vendor's human-readable message and any retry hint.
pub fn classify(
    provider: ProviderId,
    response: &VendorResponse,
    vendor_rules: &[ErrorRule],
) -> GenError {
    let status = response.status.as_u16();
    let message = error_message(&response.body);
    let lower = message.to_lowercase();

    let kind = vendor_rules
        .iter()
        .chain(DEFAULT_RULES)
        .find(|rule| {
            rule.status.matches(status)
                && (rule.needles.is_empty() || rule.needles.iter().any(|n| lower.contains(n)))
        })
        .map(|rule| rule.kind)
        .unwrap_or(ErrorKind::Unknown);

    match kind {
        ErrorKind::InvalidCredential => GenError::InvalidCredential { provider, message },
        ErrorKind::RateLimited => GenError::RateLimited {
            provider,
            retry_after: response.retry_after,
        },
        ErrorKind::QuotaExceeded => GenError::QuotaExceeded { provider, message },
        ErrorKind::BadRequest => GenError::BadRequest { provider, message },
        ErrorKind::ServerUnavailable => GenError::ServerUnavailable {
            provider,
            status: Some(status),
            message,
        },
        ErrorKind::Unknown => GenError::Unknown {
            provider,
            status: Some(status),
            message,
        },
    }
}

/// Pull a human-readable message out of a vendor error body. Tries the JSON
/// envelopes the vendors actually use, then falls back to the raw text.
pub fn error_message(body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        for path in [
            &["error", "message"][..],
            &["message"][..],
            &["error"][..],
            &["detail"][..],
        ] {
            let mut cursor = &value;
            for key in path {
                let Some(next) = cursor.get(key) else {
                    cursor = &Value::Null;
                    break;
                };
                cursor = next;
            }
            if let Some(text) = cursor.as_str()
                && !text.trim().is_empty()
            {
                return truncate(text.trim());
            }
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        "no response body".to_string()
    } else {
        truncate(text)
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        text.to_string()
    } else {
        let head: String = text.chars().take(MAX_MESSAGE_CHARS).collect();
        format!("{head}…")
    }
}
