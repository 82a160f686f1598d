//! Conversion between internal types and `OpenAI` wire format

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::ProviderError;
use crate::format;
use crate::protocol::openai::{
    OpenAiChoice, OpenAiContent, OpenAiContentPart, OpenAiFunction, OpenAiFunctionCall, OpenAiMessage, OpenAiRequest,
    OpenAiResponse, OpenAiStreamChunk, OpenAiStreamOptions, OpenAiTool, OpenAiToolCall, OpenAiUsage,
};
use crate::types::{
    CompletionRequest, Content, ContentPart, FinishReason, Message, NormalizedResponse, Role, StreamDelta, ToolCall,
    ToolCallDelta, Usage,
};

// -- Outbound: internal request -> OpenAI wire request --

/// Per-provider switches for an OpenAI-compatible payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadOptions {
    /// Ask for a trailing usage chunk when streaming
    pub include_usage: bool,
    /// Send image, document and audio parts natively instead of as text
    pub multimodal: bool,
}

type PartFormatter = fn(&ContentPart) -> OpenAiContentPart;

fn wire_request(req: &CompletionRequest, format_part: PartFormatter) -> OpenAiRequest {
    let tools = (!req.tools.is_empty()).then(|| {
        req.tools
            .iter()
            .map(|t| OpenAiTool {
                tool_type: "function".to_owned(),
                function: OpenAiFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    });

    OpenAiRequest {
        model: req.config.model.clone(),
        messages: req.messages.iter().map(|m| wire_message(m, format_part)).collect(),
        temperature: req.config.temperature,
        top_p: req.config.top_p,
        max_tokens: req.config.max_tokens,
        stop: req.config.stop.clone(),
        stream: None,
        tools,
        stream_options: None,
    }
}

fn wire_message(msg: &Message, format_part: PartFormatter) -> OpenAiMessage {
    if msg.is_tool_call() {
        let tool_calls = msg
            .tool_calls
            .values()
            .map(|tc| OpenAiToolCall {
                id: tc.id.clone(),
                tool_type: "function".to_owned(),
                function: OpenAiFunctionCall {
                    name: tc.name.clone(),
                    arguments: Value::Object(tc.arguments.clone()).to_string(),
                },
            })
            .collect();

        return OpenAiMessage {
            role: format_role(msg.role).to_owned(),
            content: (!msg.content.is_empty()).then(|| format_content(&msg.content, format_part)),
            tool_calls: Some(tool_calls),
            tool_call_id: None,
        };
    }

    if let Some(tool_call_id) = &msg.tool_call_id {
        return OpenAiMessage {
            role: format_role(Role::Tool).to_owned(),
            content: Some(OpenAiContent::Text(msg.content.as_text())),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.clone()),
        };
    }

    OpenAiMessage {
        role: format_role(msg.role).to_owned(),
        content: Some(format_content(&msg.content, format_part)),
        tool_calls: None,
        tool_call_id: None,
    }
}

/// Native role name; OpenAI-compatible APIs support all four roles
pub const fn format_role(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

fn format_content(content: &Content, format_part: PartFormatter) -> OpenAiContent {
    match content {
        Content::Text(text) => OpenAiContent::Text(text.clone()),
        Content::Parts(parts) => OpenAiContent::Parts(parts.iter().map(format_part).collect()),
    }
}

/// Build the JSON payload for a chat completion request
///
/// Providers without multimodal input get every media part as a text
/// reference.
pub fn build_payload(
    req: &CompletionRequest,
    stream: bool,
    options: PayloadOptions,
) -> Result<Map<String, Value>, ProviderError> {
    let format_part: PartFormatter = if options.multimodal {
        format::openai::format_part
    } else {
        format::openai::format_part_as_text
    };

    let mut wire = wire_request(req, format_part);
    if stream {
        wire.stream = Some(true);
        wire.stream_options = options
            .include_usage
            .then_some(OpenAiStreamOptions { include_usage: true });
    }

    let mut body = super::to_object(&wire)?;
    super::merge_missing(&mut body, &req.config.extra);
    Ok(body)
}

// -- Inbound: OpenAI wire response -> internal types --

/// Parse a non-streaming response
///
/// Only the first choice is used. Zero choices yield an empty message.
pub fn parse_response(resp: OpenAiResponse, fallback_model: &str) -> Result<NormalizedResponse, ProviderError> {
    let model_id = resp.model.filter(|m| !m.is_empty()).unwrap_or_else(|| fallback_model.to_owned());
    let usage = resp.usage.map(Usage::from).unwrap_or_default();

    let Some(choice) = resp.choices.into_iter().next() else {
        let mut message = Message::assistant(String::new());
        message.model_id = model_id;
        return Ok(NormalizedResponse::new(message, usage, None));
    };

    let OpenAiChoice {
        message: choice_message,
        finish_reason,
        ..
    } = choice;

    let mut tool_calls = IndexMap::new();
    for tc in choice_message.tool_calls.unwrap_or_default() {
        let arguments = super::parse_arguments(&tc.function.name, &tc.function.arguments)?;
        tool_calls.insert(tc.id.clone(), ToolCall::new(tc.id, tc.function.name, arguments));
    }

    let mut message = Message::assistant(choice_message.content.unwrap_or_default());
    message.tool_calls = tool_calls;
    message.model_id = model_id;

    Ok(NormalizedResponse::new(
        message,
        usage,
        finish_reason.as_deref().map(parse_finish_reason),
    ))
}

impl From<OpenAiUsage> for Usage {
    fn from(usage: OpenAiUsage) -> Self {
        Self {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

// -- Stream conversion --

/// Convert an `OpenAI` stream chunk into a normalized delta
///
/// Only the first choice contributes content, matching the batch parser.
pub fn chunk_to_delta(chunk: OpenAiStreamChunk) -> StreamDelta {
    let mut delta = StreamDelta {
        model_id: chunk.model.filter(|m| !m.is_empty()),
        usage: chunk.usage.map(Usage::from).unwrap_or_default(),
        ..StreamDelta::default()
    };

    if let Some(choice) = chunk.choices.into_iter().next() {
        delta.content = choice.delta.content;
        delta.finish_reason = choice.finish_reason.as_deref().map(parse_finish_reason);
        delta.tool_calls = choice
            .delta
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| {
                let (name, arguments) = tc.function.map_or((None, None), |f| (f.name, f.arguments));
                ToolCallDelta {
                    index: tc.index,
                    id: tc.id,
                    name,
                    arguments,
                }
            })
            .collect();
    }

    delta
}

/// Parse a finish reason string
fn parse_finish_reason(s: &str) -> FinishReason {
    match s {
        "stop" => FinishReason::Stop,
        "length" => FinishReason::Length,
        "tool_calls" | "function_call" => FinishReason::ToolCalls,
        "content_filter" => FinishReason::ContentFilter,
        other => FinishReason::Other(other.to_owned()),
    }
}
