//! Streaming aggregator
//!
//! Folds normalized [`StreamDelta`]s into one in-progress assistant message
//! and hands the caller a snapshot after every chunk. The aggregator is
//! owned by exactly one streaming call and driven sequentially.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::convert;
use crate::error::ProviderError;
use crate::provider::CallContext;
use crate::types::{FinishReason, Message, NormalizedResponse, StreamDelta, ToolCall, Usage};

/// Lifecycle of one streamed completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// No chunk received yet
    Idle,
    /// At least one chunk received
    Accumulating,
    /// Message frozen and returned
    Finalized,
    /// Stream failed; no message will be produced
    Errored,
}

/// Tool call whose arguments are still raw JSON text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialToolCall {
    /// Tool call identifier
    pub id: String,
    /// Function name
    pub name: String,
    /// Concatenated argument fragments
    pub arguments: String,
}

/// Progress view passed to the per-chunk callback
#[derive(Debug, Clone, Copy)]
pub struct StreamSnapshot<'a> {
    /// The chunk just applied
    pub delta: &'a StreamDelta,
    /// All text received so far
    pub content: &'a str,
    /// Tool calls received so far, in arrival order
    pub tool_calls: &'a [PartialToolCall],
}

/// Accumulates a streamed completion into a [`NormalizedResponse`]
pub struct StreamAggregator<F> {
    state: StreamState,
    provider: String,
    fallback_model: String,
    content: String,
    tool_calls: Vec<PartialToolCall>,
    by_index: HashMap<u32, usize>,
    usage: Usage,
    model_id: Option<String>,
    finish_reason: Option<FinishReason>,
    on_chunk: F,
}

impl<F> StreamAggregator<F>
where
    F: FnMut(&StreamSnapshot<'_>),
{
    /// Aggregator for the call described by `context`
    pub fn new(context: &CallContext, on_chunk: F) -> Self {
        Self {
            state: StreamState::Idle,
            provider: context.provider.clone(),
            fallback_model: context.model.clone(),
            content: String::new(),
            tool_calls: Vec::new(),
            by_index: HashMap::new(),
            usage: Usage::default(),
            model_id: None,
            finish_reason: None,
            on_chunk,
        }
    }

    /// Model reported when no chunk names one, instead of the requested model
    #[must_use]
    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = model.into();
        self
    }

    /// Current state
    pub const fn state(&self) -> StreamState {
        self.state
    }

    /// Text received so far
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Apply one chunk and notify the callback
    ///
    /// # Errors
    ///
    /// Returns `Malformed` if the stream already ended or failed, or if a
    /// tool-call fragment cannot be attributed to any call. The aggregator
    /// is `Errored` afterwards in the latter case.
    pub fn push_chunk(&mut self, delta: StreamDelta) -> Result<(), ProviderError> {
        match self.state {
            StreamState::Idle | StreamState::Accumulating => {}
            StreamState::Finalized => return Err(ProviderError::malformed("chunk received after the stream finished")),
            StreamState::Errored => return Err(ProviderError::malformed("chunk received after the stream failed")),
        }
        self.state = StreamState::Accumulating;

        if let Some(text) = &delta.content {
            self.content.push_str(text);
        }

        for fragment in &delta.tool_calls {
            let slot = match &fragment.id {
                Some(id) if !id.is_empty() => {
                    let slot = self.tool_calls.iter().position(|c| &c.id == id).unwrap_or_else(|| {
                        self.tool_calls.push(PartialToolCall {
                            id: id.clone(),
                            name: String::new(),
                            arguments: String::new(),
                        });
                        self.tool_calls.len() - 1
                    });
                    self.by_index.insert(fragment.index, slot);
                    slot
                }
                _ => match self.by_index.get(&fragment.index) {
                    Some(&slot) => slot,
                    None => {
                        let error = ProviderError::malformed(format!(
                            "tool call fragment at index {} has no id and no open call",
                            fragment.index
                        ));
                        return Err(self.fail(error));
                    }
                },
            };

            let call = &mut self.tool_calls[slot];
            if let Some(name) = &fragment.name
                && call.name.is_empty()
            {
                call.name.clone_from(name);
            }
            if let Some(arguments) = &fragment.arguments {
                call.arguments.push_str(arguments);
            }
        }

        self.usage.merge(delta.usage);
        if let Some(model) = &delta.model_id {
            self.model_id = Some(model.clone());
        }
        if let Some(reason) = &delta.finish_reason {
            self.finish_reason = Some(reason.clone());
        }

        (self.on_chunk)(&StreamSnapshot {
            delta: &delta,
            content: &self.content,
            tool_calls: &self.tool_calls,
        });
        Ok(())
    }

    /// Freeze the message at end of stream
    ///
    /// # Errors
    ///
    /// Returns `Malformed` if the stream already ended or failed, or if any
    /// tool call's buffered arguments are not a JSON object. The aggregator
    /// is `Errored` afterwards in the latter case.
    pub fn finalize(&mut self) -> Result<NormalizedResponse, ProviderError> {
        match self.state {
            StreamState::Idle | StreamState::Accumulating => {}
            StreamState::Finalized => return Err(ProviderError::malformed("stream was already finalized")),
            StreamState::Errored => return Err(ProviderError::malformed("cannot finalize a failed stream")),
        }

        let mut tool_calls = IndexMap::with_capacity(self.tool_calls.len());
        for partial in std::mem::take(&mut self.tool_calls) {
            let arguments = match convert::parse_arguments(&partial.name, &partial.arguments) {
                Ok(arguments) => arguments,
                Err(error) => return Err(self.fail(error)),
            };
            tool_calls.insert(partial.id.clone(), ToolCall::new(partial.id, partial.name, arguments));
        }

        let mut message = Message::assistant(std::mem::take(&mut self.content));
        message.tool_calls = tool_calls;
        message.model_id = self.model_id.take().unwrap_or_else(|| self.fallback_model.clone());

        self.state = StreamState::Finalized;
        self.by_index.clear();

        tracing::debug!(
            provider = %self.provider,
            model = %message.model_id,
            tool_calls = message.tool_calls.len(),
            "stream finalized"
        );

        Ok(NormalizedResponse::new(message, self.usage, self.finish_reason.take()))
    }

    /// Mark the stream as failed and hand the error back unchanged
    pub fn fail(&mut self, error: ProviderError) -> ProviderError {
        if self.state != StreamState::Errored {
            tracing::warn!(provider = %self.provider, kind = %error.kind, error = %error, "stream failed");
        }
        self.state = StreamState::Errored;
        self.clear();
        error
    }

    /// Abandon the stream without producing a message
    pub fn discard(mut self) {
        if self.state == StreamState::Accumulating {
            tracing::debug!(provider = %self.provider, "discarding partial stream");
        }
        self.clear();
    }

    fn clear(&mut self) {
        self.content.clear();
        self.tool_calls.clear();
        self.by_index.clear();
    }
}

impl<F> std::fmt::Debug for StreamAggregator<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamAggregator")
            .field("state", &self.state)
            .field("provider", &self.provider)
            .field("content_len", &self.content.len())
            .field("tool_calls", &self.tool_calls.len())
            .finish_non_exhaustive()
    }
}
