//! `OpenAI` chat completions adapter
//!
//! The OpenAI-compatible helpers here are shared with other providers that
//! speak the same wire format.

use http::HeaderMap;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::Value;

use super::{CallContext, PreparedRequest, ProviderAdapter, ProviderCapabilities};
use crate::convert;
use crate::convert::openai::PayloadOptions;
use crate::error::ProviderError;
use crate::protocol::openai::{OpenAiResponse, OpenAiStreamChunk};
use crate::types::{CompletionRequest, NormalizedResponse, StreamEvent};

/// Default `OpenAI` API base URL
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat completions endpoint, relative to the base URL
pub(crate) const CHAT_COMPLETIONS_PATH: &str = "chat/completions";

/// Marker that terminates an OpenAI-compatible SSE stream
const DONE_MARKER: &str = "[DONE]";

/// Canonical `OpenAI` API adapter
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiAdapter;

impl OpenAiAdapter {
    /// Create the adapter
    pub const fn new() -> Self {
        Self
    }
}

impl ProviderAdapter for OpenAiAdapter {
    fn slug(&self) -> &'static str {
        "openai"
    }

    fn default_base_url(&self) -> &'static str {
        DEFAULT_BASE_URL
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            streaming: true,
            multimodal: true,
        }
    }

    fn build_request(&self, request: &CompletionRequest, stream: bool) -> Result<PreparedRequest, ProviderError> {
        let options = PayloadOptions {
            include_usage: true,
            multimodal: self.capabilities().multimodal,
        };
        build_compatible_request(self.slug(), request, stream, options)
    }

    fn parse_response(&self, body: &Value, context: &CallContext) -> Result<NormalizedResponse, ProviderError> {
        parse_compatible_response(body, context)
    }

    fn parse_stream_chunk(&self, data: &str, _context: &CallContext) -> Result<StreamEvent, ProviderError> {
        parse_compatible_chunk(data)
    }

    fn auth_headers(&self, api_key: &SecretString) -> Result<HeaderMap, ProviderError> {
        super::bearer_auth_header(api_key)
    }
}

/// Build a chat completions request for any OpenAI-compatible provider
pub(crate) fn build_compatible_request(
    provider: &str,
    request: &CompletionRequest,
    stream: bool,
    options: PayloadOptions,
) -> Result<PreparedRequest, ProviderError> {
    super::validate_request(request)?;
    let body = convert::openai::build_payload(request, stream, options)?;

    tracing::debug!(
        provider = %provider,
        model = %request.config.model,
        messages = request.messages.len(),
        tools = request.tools.len(),
        stream,
        "built chat completions request"
    );

    Ok(PreparedRequest {
        path: CHAT_COMPLETIONS_PATH.to_owned(),
        body: Value::Object(body),
        stream,
        context: CallContext {
            provider: provider.to_owned(),
            model: request.config.model.clone(),
            path: CHAT_COMPLETIONS_PATH.to_owned(),
            tools: request.tools.clone(),
        },
    })
}

/// Parse a chat completions response body
pub(crate) fn parse_compatible_response(
    body: &Value,
    context: &CallContext,
) -> Result<NormalizedResponse, ProviderError> {
    let wire: OpenAiResponse = super::decode_body(body, "chat completion response")?;
    convert::openai::parse_response(wire, &context.model)
}

/// Parse the data of one chat completions SSE event
pub(crate) fn parse_compatible_chunk(data: &str) -> Result<StreamEvent, ProviderError> {
    if data.trim() == DONE_MARKER {
        return Ok(StreamEvent::Done);
    }

    let value = convert::decode_chunk(data)?;
    let chunk =
        OpenAiStreamChunk::deserialize(&value).map_err(|e| ProviderError::undecodable("stream chunk", &e, &value))?;
    Ok(StreamEvent::Delta(convert::openai::chunk_to_delta(chunk)))
}
