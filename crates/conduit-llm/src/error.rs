use serde::Deserialize;
use serde_json::Value;
use strum::Display;
use thiserror::Error;

/// Closed set of failure categories surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or invalid credentials
    Unauthorized,
    /// Provider rate limit or quota exhausted
    RateLimited,
    /// Provider rejected the request
    InvalidRequest,
    /// Provider or transport unavailable
    ProviderUnavailable,
    /// Response did not match any recognized shape
    Malformed,
}

impl ErrorKind {
    /// Whether retrying the same call later may succeed
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimited | Self::ProviderUnavailable)
    }
}

/// The single error type crossing the crate boundary
#[derive(Debug, Clone, Error)]
#[error("{kind}: {provider_message}")]
pub struct ProviderError {
    /// Error category
    pub kind: ErrorKind,
    /// HTTP status, when the failure came from an HTTP response
    pub http_status: Option<u16>,
    /// Human-readable message as reported by the provider
    pub provider_message: String,
    /// Original error payload for diagnostics
    pub raw: Value,
}

impl ProviderError {
    /// Error with no HTTP status and no raw payload
    pub fn new(kind: ErrorKind, provider_message: impl Into<String>) -> Self {
        Self {
            kind,
            http_status: None,
            provider_message: provider_message.into(),
            raw: Value::Null,
        }
    }

    /// `Malformed` error
    pub fn malformed(provider_message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Malformed, provider_message)
    }

    /// `Malformed` error for a payload that failed to decode
    pub fn undecodable(what: &str, error: &serde_json::Error, raw: &Value) -> Self {
        Self::malformed(format!("failed to decode {what}: {error}")).with_raw(raw.clone())
    }

    /// Attach the HTTP status
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    /// Attach the raw payload
    #[must_use]
    pub fn with_raw(mut self, raw: Value) -> Self {
        self.raw = raw;
        self
    }

    /// Whether retrying the same call later may succeed
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

// -- Error envelopes --

/// `{"error": ...}` body used by OpenAI-compatible APIs and Gemini
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorPayload,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorPayload {
    Detail(ErrorDetail),
    Message(String),
}

/// Union of the OpenAI (`type`, string `code`) and Gemini (numeric `code`,
/// `status`, `details`) error shapes
#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    error_type: Option<String>,
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    details: Vec<Value>,
}

impl ErrorPayload {
    fn detail(&self) -> Option<&ErrorDetail> {
        match self {
            Self::Detail(detail) => Some(detail),
            Self::Message(_) => None,
        }
    }

    fn message(&self) -> Option<&str> {
        match self {
            Self::Detail(detail) => detail.message.as_deref(),
            Self::Message(message) => Some(message),
        }
    }
}

/// Kind implied by the status code alone, regardless of body
const fn kind_from_status(status: u16) -> Option<ErrorKind> {
    match status {
        401 | 403 => Some(ErrorKind::Unauthorized),
        429 => Some(ErrorKind::RateLimited),
        500..=599 => Some(ErrorKind::ProviderUnavailable),
        _ => None,
    }
}

/// Kind implied by the provider's own error classification
fn kind_from_detail(detail: &ErrorDetail) -> Option<ErrorKind> {
    let invalid_key = detail
        .details
        .iter()
        .any(|d| d.get("reason").and_then(Value::as_str) == Some("API_KEY_INVALID"));
    if invalid_key {
        return Some(ErrorKind::Unauthorized);
    }

    if let Some(status) = detail.status.as_deref() {
        let kind = match status {
            "UNAUTHENTICATED" | "PERMISSION_DENIED" => Some(ErrorKind::Unauthorized),
            "RESOURCE_EXHAUSTED" => Some(ErrorKind::RateLimited),
            "UNAVAILABLE" | "INTERNAL" | "DEADLINE_EXCEEDED" => Some(ErrorKind::ProviderUnavailable),
            "INVALID_ARGUMENT" | "FAILED_PRECONDITION" | "NOT_FOUND" | "OUT_OF_RANGE" => {
                Some(ErrorKind::InvalidRequest)
            }
            _ => None,
        };
        if kind.is_some() {
            return kind;
        }
    }

    let code = detail.code.as_ref().and_then(|code| match code {
        Value::String(s) => Some(s.as_str()),
        _ => None,
    });
    let by_label = |label: &str| match label {
        "authentication_error" | "invalid_api_key" => Some(ErrorKind::Unauthorized),
        "rate_limit_error" | "rate_limit_exceeded" | "insufficient_quota" => Some(ErrorKind::RateLimited),
        "server_error" | "service_unavailable" | "overloaded_error" => Some(ErrorKind::ProviderUnavailable),
        "invalid_request_error" | "not_found_error" | "context_length_exceeded" => Some(ErrorKind::InvalidRequest),
        _ => None,
    };
    if let Some(kind) = code.and_then(by_label).or_else(|| detail.error_type.as_deref().and_then(by_label)) {
        return Some(kind);
    }

    // Gemini repeats the HTTP status as a numeric code
    detail
        .code
        .as_ref()
        .and_then(Value::as_u64)
        .and_then(|code| u16::try_from(code).ok())
        .and_then(kind_from_status)
}

/// Extract an error envelope, accepting Gemini's array-wrapped variant
fn envelope(value: &Value) -> Option<ErrorEnvelope> {
    let candidate = match value {
        Value::Array(items) => items.first()?,
        other => other,
    };
    candidate.get("error")?;
    ErrorEnvelope::deserialize(candidate).ok()
}

/// Map an error envelope found inside a response body or stream chunk
///
/// Returns `None` when `value` carries no `error` envelope. In-band errors
/// that cannot be classified are treated as the provider failing mid-turn.
pub fn map_error_value(http_status: Option<u16>, value: &Value) -> Option<ProviderError> {
    let envelope = envelope(value)?;

    let kind = http_status
        .and_then(kind_from_status)
        .or_else(|| envelope.error.detail().and_then(kind_from_detail))
        .unwrap_or(match http_status {
            Some(400..=499) => ErrorKind::InvalidRequest,
            Some(_) => ErrorKind::Malformed,
            None => ErrorKind::ProviderUnavailable,
        });

    let message = envelope
        .error
        .message()
        .map_or_else(|| value.to_string(), ToOwned::to_owned);

    let mut error = ProviderError::new(kind, message).with_raw(value.clone());
    error.http_status = http_status;
    Some(error)
}

/// Map a failed HTTP response to a `ProviderError`
///
/// Total over every status and body: auth, rate-limit and server statuses
/// win outright; otherwise the body must be JSON, and a recognized envelope
/// refines the kind before falling back to `InvalidRequest` for other 4xx
/// statuses and `Malformed` for anything else.
pub fn map_http_error(status: u16, body: &str) -> ProviderError {
    let parsed = serde_json::from_str::<Value>(body);

    if let Some(kind) = kind_from_status(status) {
        let (message, raw) = match &parsed {
            Ok(value) => (
                envelope(value)
                    .and_then(|e| e.error.message().map(ToOwned::to_owned))
                    .unwrap_or_else(|| body.to_owned()),
                value.clone(),
            ),
            Err(_) => (body.to_owned(), Value::String(body.to_owned())),
        };
        return ProviderError::new(kind, message).with_status(status).with_raw(raw);
    }

    let Ok(value) = parsed else {
        return ProviderError::malformed(format!("provider returned {status} with a non-JSON body: {body}"))
            .with_status(status)
            .with_raw(Value::String(body.to_owned()));
    };

    if let Some(error) = map_error_value(Some(status), &value) {
        return error;
    }

    let kind = if (400..500).contains(&status) {
        ErrorKind::InvalidRequest
    } else {
        ErrorKind::Malformed
    };
    ProviderError::new(kind, body.to_owned()).with_status(status).with_raw(value)
}
