//! OpenAI-compatible content parts

use crate::protocol::openai::{OpenAiContentPart, OpenAiFile, OpenAiImageUrl, OpenAiInputAudio};
use crate::types::{ContentPart, Media, MediaSource};

/// Format a content part for OpenAI-compatible chat completions
///
/// Images accept URLs and data URIs. Documents and audio must be inline;
/// remote ones degrade to a text part naming the URL.
pub fn format_part(part: &ContentPart) -> OpenAiContentPart {
    match part {
        ContentPart::Text { text } => OpenAiContentPart::Text { text: text.clone() },
        ContentPart::Image(media) => OpenAiContentPart::ImageUrl {
            image_url: OpenAiImageUrl {
                url: super::media_uri(media),
            },
        },
        ContentPart::Pdf(media) => match super::inline_base64(&media.source) {
            Some(_) => OpenAiContentPart::File {
                file: OpenAiFile {
                    filename: "document.pdf".to_owned(),
                    file_data: super::media_uri(media),
                },
            },
            None => remote_reference("document", media),
        },
        ContentPart::Audio(media) => match super::inline_base64(&media.source) {
            Some(data) => OpenAiContentPart::InputAudio {
                input_audio: OpenAiInputAudio {
                    data: data.into_owned(),
                    format: audio_format(&media.mime_type),
                },
            },
            None => remote_reference("audio", media),
        },
        ContentPart::Other { kind, data } => {
            tracing::debug!(kind = %kind, "formatting unsupported content part as text");
            OpenAiContentPart::Text {
                text: super::stringify_unknown(kind, data),
            }
        }
    }
}

/// Format a content part for a provider that only accepts text
///
/// Media parts become a short text reference. Inline payloads are left out.
pub fn format_part_as_text(part: &ContentPart) -> OpenAiContentPart {
    match part {
        ContentPart::Image(media) => media_reference("image", media),
        ContentPart::Pdf(media) => media_reference("document", media),
        ContentPart::Audio(media) => media_reference("audio", media),
        ContentPart::Text { .. } | ContentPart::Other { .. } => format_part(part),
    }
}

fn media_reference(label: &str, media: &Media) -> OpenAiContentPart {
    tracing::debug!(mime_type = %media.mime_type, "provider is text-only, sending {label} as text");
    let text = match &media.source {
        MediaSource::Url(url) => format!("[{label}: {url}]"),
        MediaSource::Bytes(_) | MediaSource::Base64(_) => format!("[{label}: {} omitted]", media.mime_type),
    };
    OpenAiContentPart::Text { text }
}

fn remote_reference(label: &str, media: &Media) -> OpenAiContentPart {
    tracing::debug!(mime_type = %media.mime_type, "remote {label} is not supported inline, sending URL as text");
    OpenAiContentPart::Text {
        text: format!("[{label}: {}]", super::media_uri(media)),
    }
}

/// Audio format name expected by `input_audio`, derived from the MIME type
fn audio_format(mime_type: &str) -> String {
    let subtype = mime_type.rsplit('/').next().unwrap_or(mime_type);
    match subtype {
        "wav" | "x-wav" | "wave" | "vnd.wave" => "wav".to_owned(),
        "mpeg" | "mp3" | "x-mp3" => "mp3".to_owned(),
        other => other.to_owned(),
    }
}
