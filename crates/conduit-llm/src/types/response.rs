use serde::{Deserialize, Serialize};

use super::message::Message;

/// Reason the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of generation
    Stop,
    /// Hit the token limit
    Length,
    /// Model decided to call a tool
    ToolCalls,
    /// Content was filtered by safety systems
    ContentFilter,
    /// Provider-specific reason kept verbatim
    Other(String),
}

/// Token usage statistics
///
/// Counters the provider did not report stay `None`; zero is a measured value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the prompt
    pub input_tokens: Option<u32>,
    /// Tokens generated in the completion
    pub output_tokens: Option<u32>,
    /// Total tokens as reported by the provider
    pub total_tokens: Option<u32>,
}

impl Usage {
    /// Whether the provider reported nothing
    pub const fn is_empty(&self) -> bool {
        self.input_tokens.is_none() && self.output_tokens.is_none() && self.total_tokens.is_none()
    }

    /// Overlay counters from a later report, keeping earlier ones it lacks
    pub(crate) fn merge(&mut self, later: Self) {
        self.input_tokens = later.input_tokens.or(self.input_tokens);
        self.output_tokens = later.output_tokens.or(self.output_tokens);
        self.total_tokens = later.total_tokens.or(self.total_tokens);
    }
}

/// Normalized result of one completion, streaming or not
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedResponse {
    /// Assistant message, token counters and model id included
    pub message: Message,
    /// Usage counters as reported by the provider
    pub usage: Usage,
    /// Why generation stopped, if reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

impl NormalizedResponse {
    /// Assemble a response, copying usage counters onto the message
    pub fn new(mut message: Message, usage: Usage, finish_reason: Option<FinishReason>) -> Self {
        message.input_tokens = usage.input_tokens;
        message.output_tokens = usage.output_tokens;
        Self {
            message,
            usage,
            finish_reason,
        }
    }

    /// Text content of the assistant message
    pub fn content(&self) -> String {
        self.message.content.as_text()
    }
}
