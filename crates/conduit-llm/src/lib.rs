//! Provider normalization layer for Conduit
//!
//! Translates a provider-agnostic conversation into `OpenAI`, Gemini and
//! `DeepSeek` chat requests, parses batch and streamed responses back into one
//! [`NormalizedResponse`], and maps every failure into a single
//! [`ProviderError`] taxonomy.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod client;
pub mod convert;
pub mod error;
pub mod format;
pub mod protocol;
pub mod provider;
pub mod stream;
pub mod types;

pub use client::LlmClient;
pub use error::{ErrorKind, ProviderError, map_http_error};
pub use provider::{
    CallContext, DeepSeekAdapter, GeminiAdapter, OpenAiAdapter, PreparedRequest, ProviderAdapter,
    ProviderCapabilities, ProviderRegistry, bearer_auth_header,
};
pub use stream::{PartialToolCall, StreamAggregator, StreamSnapshot, StreamState};
pub use types::{
    CompletionRequest, Content, ContentPart, FinishReason, GenerationConfig, Media, MediaSource, Message,
    NormalizedResponse, Role, StreamDelta, StreamEvent, ToolCall, ToolDefinition, Usage,
};
