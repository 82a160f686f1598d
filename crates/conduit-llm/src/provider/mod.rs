//! Provider adapters and the registry that resolves them by slug
//!
//! An adapter is stateless: it builds request payloads, parses responses and
//! stream chunks, and classifies error bodies. Transport lives in
//! [`LlmClient`](crate::client::LlmClient).

pub mod deepseek;
pub mod gemini;
pub mod openai;

use std::collections::HashMap;
use std::sync::Arc;

use conduit_config::LlmProviderType;
use http::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ErrorKind, ProviderError, map_error_value, map_http_error};
use crate::types::{CompletionRequest, NormalizedResponse, StreamEvent, ToolDefinition};

pub use deepseek::DeepSeekAdapter;
pub use gemini::GeminiAdapter;
pub use openai::OpenAiAdapter;

/// Capabilities advertised by a provider
#[derive(Debug, Clone, Copy)]
pub struct ProviderCapabilities {
    /// Whether the provider supports streaming responses
    pub streaming: bool,
    /// Whether the provider accepts image, document or audio parts
    pub multimodal: bool,
}

/// Call-scoped state handed from the request builder to the parsers
#[derive(Debug, Clone, PartialEq)]
pub struct CallContext {
    /// Adapter slug
    pub provider: String,
    /// Model requested by the caller
    pub model: String,
    /// Request path relative to the base URL
    pub path: String,
    /// Tools declared for this call
    pub tools: Vec<ToolDefinition>,
}

/// A request ready to be sent
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    /// Path relative to the provider base URL
    pub path: String,
    /// JSON payload
    pub body: Value,
    /// Whether the response is an SSE stream
    pub stream: bool,
    /// Context the response parsers need
    pub context: CallContext,
}

/// Trait implemented by each LLM provider
pub trait ProviderAdapter: Send + Sync {
    /// Stable identifier (e.g. "openai")
    fn slug(&self) -> &str;

    /// Base URL used when configuration does not override it
    fn default_base_url(&self) -> &str;

    /// Advertised capabilities
    fn capabilities(&self) -> ProviderCapabilities;

    /// Build the payload and path for a completion
    fn build_request(&self, request: &CompletionRequest, stream: bool) -> Result<PreparedRequest, ProviderError>;

    /// Model to report when a response does not name one
    fn fallback_model<'a>(&self, context: &'a CallContext) -> &'a str {
        &context.model
    }

    /// Parse a successful non-streaming response body
    fn parse_response(&self, body: &Value, context: &CallContext) -> Result<NormalizedResponse, ProviderError>;

    /// Parse the data of one SSE event
    fn parse_stream_chunk(&self, data: &str, context: &CallContext) -> Result<StreamEvent, ProviderError>;

    /// Classify a non-success HTTP response
    fn map_error(&self, status: u16, body: &str) -> ProviderError {
        map_http_error(status, body)
    }

    /// Headers that authenticate a request with `api_key`
    fn auth_headers(&self, api_key: &SecretString) -> Result<HeaderMap, ProviderError>;
}

/// `Authorization: Bearer <key>` header used by OpenAI-compatible APIs
pub fn bearer_auth_header(api_key: &SecretString) -> Result<HeaderMap, ProviderError> {
    let value = sensitive_value(&format!("Bearer {}", api_key.expose_secret()))?;
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}

/// Single header carrying the raw key
pub(crate) fn api_key_header(name: &'static str, api_key: &SecretString) -> Result<HeaderMap, ProviderError> {
    let value = sensitive_value(api_key.expose_secret())?;
    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static(name), value);
    Ok(headers)
}

fn sensitive_value(raw: &str) -> Result<HeaderValue, ProviderError> {
    let mut value = HeaderValue::from_str(raw).map_err(|_| {
        ProviderError::new(
            ErrorKind::InvalidRequest,
            "API key contains characters that are not valid in an HTTP header",
        )
    })?;
    value.set_sensitive(true);
    Ok(value)
}

/// Reject requests no provider can serve
pub(crate) fn validate_request(request: &CompletionRequest) -> Result<(), ProviderError> {
    if request.config.model.trim().is_empty() {
        return Err(ProviderError::new(ErrorKind::InvalidRequest, "model must not be empty"));
    }
    if request.messages.is_empty() {
        return Err(ProviderError::new(
            ErrorKind::InvalidRequest,
            "conversation must contain at least one message",
        ));
    }
    Ok(())
}

/// Decode a response body into its wire shape, surfacing error envelopes first
pub(crate) fn decode_body<T: DeserializeOwned>(body: &Value, what: &str) -> Result<T, ProviderError> {
    if let Some(error) = map_error_value(None, body) {
        return Err(error);
    }
    <T as serde::Deserialize>::deserialize(body).map_err(|e| ProviderError::undecodable(what, &e, body))
}

/// Lookup table from slug to adapter
#[derive(Clone)]
pub struct ProviderRegistry {
    adapters: HashMap<String, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    /// Registry with no adapters
    pub fn empty() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Register an adapter under its slug, replacing any previous one
    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        let slug = adapter.slug().to_owned();
        if self.adapters.insert(slug.clone(), adapter).is_some() {
            tracing::debug!(provider = %slug, "replaced registered adapter");
        }
    }

    /// Look up an adapter by slug
    pub fn get(&self, slug: &str) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.get(slug).cloned()
    }

    /// Adapter for a configured provider type
    pub fn for_type(&self, provider_type: LlmProviderType) -> Option<Arc<dyn ProviderAdapter>> {
        self.get(provider_type.slug())
    }

    /// Registered slugs, sorted
    pub fn slugs(&self) -> Vec<&str> {
        let mut slugs: Vec<_> = self.adapters.keys().map(String::as_str).collect();
        slugs.sort_unstable();
        slugs
    }
}

impl Default for ProviderRegistry {
    /// Registry with the built-in `OpenAI`, Gemini and `DeepSeek` adapters
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(OpenAiAdapter::new()));
        registry.register(Arc::new(GeminiAdapter));
        registry.register(Arc::new(DeepSeekAdapter::new()));
        registry
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry").field("adapters", &self.slugs()).finish()
    }
}
