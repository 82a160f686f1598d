//! Per-modality content formatters
//!
//! Each provider module turns a [`ContentPart`](crate::types::ContentPart)
//! into that provider's content-part shape. Parts a provider cannot express
//! degrade to text instead of failing.

pub mod gemini;
pub mod openai;

use std::borrow::Cow;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::types::{Media, MediaSource};

/// Base64 payload for inline media, `None` for remote URLs
pub(crate) fn inline_base64(source: &MediaSource) -> Option<Cow<'_, str>> {
    match source {
        MediaSource::Bytes(bytes) => Some(Cow::Owned(STANDARD.encode(bytes))),
        MediaSource::Base64(data) => Some(Cow::Borrowed(data.as_str())),
        MediaSource::Url(_) => None,
    }
}

/// `data:` URI for inline media, the URL itself for remote media
pub(crate) fn media_uri(media: &Media) -> String {
    match (&media.source, inline_base64(&media.source)) {
        (MediaSource::Url(url), _) => url.clone(),
        (_, Some(data)) => format!("data:{};base64,{data}", media.mime_type),
        (_, None) => String::new(),
    }
}

/// Best-effort text rendering of a part no formatter understands
pub(crate) fn stringify_unknown(kind: &str, data: &serde_json::Value) -> String {
    serde_json::json!({ "type": kind, "data": data }).to_string()
}
