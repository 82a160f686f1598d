//! HTTP client that drives provider adapters

use std::sync::Arc;
use std::time::Duration;

use conduit_config::{LlmConfig, LlmProviderConfig};
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use http::HeaderMap;
use indexmap::IndexMap;
use reqwest::{Client, Response};
use secrecy::SecretString;
use serde_json::Value;
use url::Url;

use crate::error::{ErrorKind, ProviderError};
use crate::provider::{PreparedRequest, ProviderAdapter, ProviderRegistry};
use crate::stream::{StreamAggregator, StreamSnapshot};
use crate::types::{CompletionRequest, NormalizedResponse, StreamEvent};

/// A configured provider: adapter plus where and how to reach it
struct Endpoint {
    adapter: Arc<dyn ProviderAdapter>,
    base_url: Url,
    api_key: Option<SecretString>,
    timeout: Option<Duration>,
}

impl Endpoint {
    fn url(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/{path}")
    }
}

/// Client for every provider named in configuration
pub struct LlmClient {
    http: Client,
    endpoints: IndexMap<String, Endpoint>,
}

impl LlmClient {
    /// Create from configuration using the built-in adapters
    pub fn from_config(config: &LlmConfig) -> Result<Self, ProviderError> {
        Self::with_registry(config, &ProviderRegistry::default())
    }

    /// Create from configuration, resolving adapters from `registry`
    pub fn with_registry(config: &LlmConfig, registry: &ProviderRegistry) -> Result<Self, ProviderError> {
        let mut endpoints = IndexMap::with_capacity(config.providers.len());
        for (name, provider) in &config.providers {
            let endpoint = endpoint(config, name, provider, registry)?;
            tracing::debug!(
                provider = %name,
                adapter = %endpoint.adapter.slug(),
                base_url = %endpoint.base_url,
                "registered LLM provider"
            );
            endpoints.insert(name.clone(), endpoint);
        }

        Ok(Self {
            http: Client::new(),
            endpoints,
        })
    }

    /// Configured provider names, in configuration order
    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }

    /// Run a completion and return the parsed response
    pub async fn complete(
        &self,
        provider: &str,
        request: &CompletionRequest,
    ) -> Result<NormalizedResponse, ProviderError> {
        let endpoint = self.endpoint(provider)?;
        let prepared = endpoint.adapter.build_request(request, false)?;
        let response = self.send(provider, endpoint, &prepared).await?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(provider, "failed to read response body", &e))?;
        let body: Value = serde_json::from_slice(&bytes).map_err(|e| {
            ProviderError::malformed(format!("response body is not valid JSON: {e}"))
                .with_status(status)
                .with_raw(Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        })?;

        let parsed = endpoint.adapter.parse_response(&body, &prepared.context)?;
        tracing::debug!(
            provider = %provider,
            model = %parsed.message.model_id,
            input_tokens = ?parsed.usage.input_tokens,
            output_tokens = ?parsed.usage.output_tokens,
            "completion finished"
        );
        Ok(parsed)
    }

    /// Run a streaming completion, calling `on_chunk` after every chunk
    ///
    /// Returns the same response type as [`complete`](Self::complete) once
    /// the stream ends.
    pub async fn complete_stream<F>(
        &self,
        provider: &str,
        request: &CompletionRequest,
        on_chunk: F,
    ) -> Result<NormalizedResponse, ProviderError>
    where
        F: FnMut(&StreamSnapshot<'_>),
    {
        let endpoint = self.endpoint(provider)?;
        if !endpoint.adapter.capabilities().streaming {
            return Err(ProviderError::new(
                ErrorKind::InvalidRequest,
                format!("provider '{provider}' does not support streaming"),
            ));
        }

        let prepared = endpoint.adapter.build_request(request, true)?;
        let response = self.send(provider, endpoint, &prepared).await?;

        let mut aggregator = StreamAggregator::new(&prepared.context, on_chunk)
            .with_fallback_model(endpoint.adapter.fallback_model(&prepared.context));
        let mut events = response.bytes_stream().eventsource();

        while let Some(event) = events.next().await {
            let event = match event {
                Ok(event) => event,
                Err(e) => {
                    let error = ProviderError::new(ErrorKind::ProviderUnavailable, format!("stream interrupted: {e}"));
                    return Err(aggregator.fail(error));
                }
            };

            if event.data.trim().is_empty() {
                continue;
            }

            match endpoint.adapter.parse_stream_chunk(&event.data, &prepared.context) {
                Ok(StreamEvent::Delta(delta)) => aggregator.push_chunk(delta)?,
                Ok(StreamEvent::Done) => return aggregator.finalize(),
                Err(error) => return Err(aggregator.fail(error)),
            }
        }

        // Gemini closes the stream without a marker
        aggregator.finalize()
    }

    fn endpoint(&self, provider: &str) -> Result<&Endpoint, ProviderError> {
        self.endpoints.get(provider).ok_or_else(|| {
            ProviderError::new(
                ErrorKind::InvalidRequest,
                format!("unknown LLM provider '{provider}'"),
            )
        })
    }

    /// Post a prepared request, mapping transport and HTTP failures
    async fn send(
        &self,
        provider: &str,
        endpoint: &Endpoint,
        prepared: &PreparedRequest,
    ) -> Result<Response, ProviderError> {
        let headers = match &endpoint.api_key {
            Some(key) => endpoint.adapter.auth_headers(key)?,
            None => {
                tracing::debug!(provider = %provider, "no API key configured, sending unauthenticated request");
                HeaderMap::new()
            }
        };

        let mut builder = self
            .http
            .post(endpoint.url(&prepared.path))
            .headers(headers)
            .json(&prepared.body);
        if let Some(timeout) = endpoint.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(provider, "upstream request failed", &e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .map_err(|e| transport_error(provider, "failed to read error body", &e))?;
        let error = endpoint.adapter.map_error(status.as_u16(), &body);
        tracing::warn!(
            provider = %provider,
            status = %status,
            kind = %error.kind,
            "upstream returned error"
        );
        Err(error)
    }
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("providers", &self.endpoints.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

fn endpoint(
    config: &LlmConfig,
    name: &str,
    provider: &LlmProviderConfig,
    registry: &ProviderRegistry,
) -> Result<Endpoint, ProviderError> {
    let adapter = registry.for_type(provider.provider_type).ok_or_else(|| {
        ProviderError::new(
            ErrorKind::InvalidRequest,
            format!(
                "provider '{name}' has type '{}' but no adapter is registered for it",
                provider.provider_type.slug()
            ),
        )
    })?;

    let base_url = match &provider.base_url {
        Some(url) => url.clone(),
        None => Url::parse(adapter.default_base_url()).map_err(|e| {
            ProviderError::new(
                ErrorKind::InvalidRequest,
                format!("adapter '{}' has an invalid default base URL: {e}", adapter.slug()),
            )
        })?,
    };

    Ok(Endpoint {
        adapter,
        base_url,
        api_key: provider.api_key.clone(),
        timeout: config.timeout_for(provider),
    })
}

/// Transport failures carry no HTTP status and are always retryable
fn transport_error(provider: &str, context: &str, error: &reqwest::Error) -> ProviderError {
    tracing::error!(provider = %provider, error = %error, timeout = error.is_timeout(), "{context}");
    ProviderError::new(ErrorKind::ProviderUnavailable, format!("{context}: {error}"))
}
