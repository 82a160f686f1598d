//! Gemini `generateContent` adapter

use http::HeaderMap;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::Value;

use super::{CallContext, PreparedRequest, ProviderAdapter, ProviderCapabilities};
use crate::convert;
use crate::error::ProviderError;
use crate::protocol::gemini::GeminiResponse;
use crate::types::{CompletionRequest, NormalizedResponse, StreamEvent};

/// Default Google Generative Language API base URL
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Header carrying the API key
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Google Gemini adapter
#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiAdapter;

impl ProviderAdapter for GeminiAdapter {
    fn slug(&self) -> &'static str {
        "gemini"
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
        super::validate_request(request)?;
        let body = convert::gemini::build_payload(request)?;
        let path = convert::gemini::request_path(&request.config.model, stream);

        tracing::debug!(
            provider = %self.slug(),
            model = %request.config.model,
            contents = request.messages.len(),
            tools = request.tools.len(),
            stream,
            "built generateContent request"
        );

        Ok(PreparedRequest {
            path: path.clone(),
            body: Value::Object(body),
            stream,
            context: CallContext {
                provider: self.slug().to_owned(),
                model: request.config.model.clone(),
                path,
                tools: request.tools.clone(),
            },
        })
    }

    fn fallback_model<'a>(&self, context: &'a CallContext) -> &'a str {
        convert::gemini::fallback_model(context)
    }

    fn parse_response(&self, body: &Value, context: &CallContext) -> Result<NormalizedResponse, ProviderError> {
        let wire: GeminiResponse = super::decode_body(body, "generateContent response")?;
        convert::gemini::parse_response(wire, context)
    }

    /// Gemini has no end-of-stream marker; the SSE stream simply closes
    fn parse_stream_chunk(&self, data: &str, context: &CallContext) -> Result<StreamEvent, ProviderError> {
        let value = convert::decode_chunk(data)?;
        let chunk =
            GeminiResponse::deserialize(&value).map_err(|e| ProviderError::undecodable("stream chunk", &e, &value))?;
        Ok(StreamEvent::Delta(convert::gemini::chunk_to_delta(chunk, context)))
    }

    fn auth_headers(&self, api_key: &SecretString) -> Result<HeaderMap, ProviderError> {
        super::api_key_header(API_KEY_HEADER, api_key)
    }
}
