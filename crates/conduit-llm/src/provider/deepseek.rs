//! `DeepSeek` adapter
//!
//! `DeepSeek` speaks the `OpenAI` chat completions format with bearer auth.
//! It does not accept `stream_options`.

use http::HeaderMap;
use secrecy::SecretString;
use serde_json::Value;

use super::openai::{build_compatible_request, parse_compatible_chunk, parse_compatible_response};
use super::{CallContext, PreparedRequest, ProviderAdapter, ProviderCapabilities};
use crate::convert::openai::PayloadOptions;
use crate::error::ProviderError;
use crate::types::{CompletionRequest, NormalizedResponse, StreamEvent};

/// Default `DeepSeek` API base URL
const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";

/// `DeepSeek` chat completions adapter
#[derive(Debug, Clone, Copy, Default)]
pub struct DeepSeekAdapter;

impl DeepSeekAdapter {
    /// Create the adapter
    pub const fn new() -> Self {
        Self
    }
}

impl ProviderAdapter for DeepSeekAdapter {
    fn slug(&self) -> &'static str {
        "deepseek"
    }

    fn default_base_url(&self) -> &'static str {
        DEFAULT_BASE_URL
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            streaming: true,
            multimodal: false,
        }
    }

    fn build_request(&self, request: &CompletionRequest, stream: bool) -> Result<PreparedRequest, ProviderError> {
        let options = PayloadOptions {
            include_usage: false,
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
