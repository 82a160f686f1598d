//! Provider-agnostic conversation model
//!
//! Every adapter builds requests from, and parses responses into, these types.

pub mod message;
pub mod request;
pub mod response;
pub mod stream;
pub mod tool;

pub use message::{Content, ContentPart, Media, MediaSource, Message, Role, ToolCall};
pub use request::{CompletionRequest, GenerationConfig};
pub use response::{FinishReason, NormalizedResponse, Usage};
pub use stream::{StreamDelta, StreamEvent, ToolCallDelta};
pub use tool::ToolDefinition;
