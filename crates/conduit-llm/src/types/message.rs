use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Role of a message participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instruction
    System,
    /// User message
    User,
    /// Assistant response
    Assistant,
    /// Tool/function result
    Tool,
}

/// Message in a conversation
///
/// A message is exactly one of: plain content, a tool invocation (non-empty
/// `tool_calls`), or a tool result (`tool_call_id` set). The constructors
/// below are the only way to build each shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message author
    pub role: Role,
    /// Message content
    pub content: Content,
    /// Tool calls requested by the assistant, keyed by call id
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub tool_calls: IndexMap<String, ToolCall>,
    /// ID of the tool call this message is a response to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Prompt tokens reported by the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u32>,
    /// Completion tokens reported by the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u32>,
    /// Model that produced this message (empty for caller-authored turns)
    #[serde(default)]
    pub model_id: String,
}

impl Message {
    fn with_role(role: Role, content: impl Into<Content>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: IndexMap::new(),
            tool_call_id: None,
            input_tokens: None,
            output_tokens: None,
            model_id: String::new(),
        }
    }

    /// System instruction
    pub fn system(content: impl Into<Content>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// User turn
    pub fn user(content: impl Into<Content>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Assistant turn with plain content
    pub fn assistant(content: impl Into<Content>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Assistant turn requesting tool invocations
    ///
    /// Calls sharing an id collapse to the last one.
    pub fn tool_invocation(calls: impl IntoIterator<Item = ToolCall>) -> Self {
        let mut message = Self::with_role(Role::Assistant, String::new());
        message.tool_calls = calls.into_iter().map(|call| (call.id.clone(), call)).collect();
        message
    }

    /// Result of executing the tool call `tool_call_id`
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<Content>) -> Self {
        let mut message = Self::with_role(Role::Tool, content);
        message.tool_call_id = Some(tool_call_id.into());
        message
    }

    /// Whether this message requests tool invocations
    pub fn is_tool_call(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Whether this message carries a tool result
    pub const fn is_tool_result(&self) -> bool {
        self.tool_call_id.is_some()
    }
}

/// Message content, either plain text or structured parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    /// Plain text content
    Text(String),
    /// Ordered content parts (text, images, documents, audio)
    Parts(Vec<ContentPart>),
}

impl Content {
    /// Extract text content, joining text parts without a separator
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }

    /// Whether there is no content at all
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Parts(parts) => parts.is_empty(),
        }
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Vec<ContentPart>> for Content {
    fn from(parts: Vec<ContentPart>) -> Self {
        Self::Parts(parts)
    }
}

/// Individual part within a multipart message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text block
    Text {
        /// The text string
        text: String,
    },
    /// Image
    Image(Media),
    /// PDF document
    Pdf(Media),
    /// Audio clip
    Audio(Media),
    /// A modality this crate does not know how to format
    ///
    /// Formatters degrade it to a stringified text part.
    Other {
        /// Declared part type
        kind: String,
        /// Opaque payload
        data: serde_json::Value,
    },
}

impl ContentPart {
    /// Text part
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Image part
    pub fn image(source: MediaSource, mime_type: impl Into<String>) -> Self {
        Self::Image(Media::new(source, mime_type))
    }

    /// PDF part
    pub fn pdf(source: MediaSource) -> Self {
        Self::Pdf(Media::new(source, "application/pdf"))
    }

    /// Audio part
    pub fn audio(source: MediaSource, mime_type: impl Into<String>) -> Self {
        Self::Audio(Media::new(source, mime_type))
    }
}

/// Binary payload plus its MIME type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    /// Where the bytes come from
    pub source: MediaSource,
    /// MIME type (e.g. "image/png")
    pub mime_type: String,
}

impl Media {
    /// Create a media payload
    pub fn new(source: MediaSource, mime_type: impl Into<String>) -> Self {
        Self {
            source,
            mime_type: mime_type.into(),
        }
    }
}

/// Origin of a media payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaSource {
    /// Raw bytes, base64-encoded on the wire
    Bytes(Vec<u8>),
    /// Already base64-encoded data
    Base64(String),
    /// Remote URI the provider fetches itself
    Url(String),
}

/// A tool/function call requested by the assistant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call
    pub id: String,
    /// Name of the function to call
    pub name: String,
    /// Parsed arguments
    #[serde(default)]
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

impl ToolCall {
    /// Create a tool call
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn constructors_produce_exclusive_shapes() {
        let plain = Message::user("hi");
        assert!(!plain.is_tool_call() && !plain.is_tool_result());

        let invocation = Message::tool_invocation([ToolCall::new("call_1", "lookup", serde_json::Map::new())]);
        assert!(invocation.is_tool_call() && !invocation.is_tool_result());
        assert_eq!(invocation.role, Role::Assistant);

        let result = Message::tool_result("call_1", "42");
        assert!(result.is_tool_result() && !result.is_tool_call());
        assert_eq!(result.role, Role::Tool);
    }

    #[test]
    fn tool_calls_are_unique_by_id() {
        let first = ToolCall::new("dup", "a", serde_json::Map::new());
        let second = ToolCall::new("dup", "b", serde_json::Map::new());
        let message = Message::tool_invocation([first, second]);
        assert_eq!(message.tool_calls.len(), 1);
        assert_eq!(message.tool_calls["dup"].name, "b");
    }

    #[test]
    fn as_text_concatenates_text_parts_only() {
        let content = Content::Parts(vec![
            ContentPart::text("Hello, "),
            ContentPart::image(MediaSource::Url("https://example.com/a.png".to_owned()), "image/png"),
            ContentPart::text("world"),
        ]);
        assert_eq!(content.as_text(), "Hello, world");
    }

    #[test]
    fn content_part_serializes_with_type_tag() {
        let part = ContentPart::pdf(MediaSource::Base64("JVBERi0=".to_owned()));
        let value = serde_json::to_value(&part).unwrap();
        assert_eq!(
            value,
            json!({"type": "pdf", "source": {"base64": "JVBERi0="}, "mime_type": "application/pdf"})
        );
    }
}
