//! Gemini content parts

use crate::protocol::gemini::{GeminiBlob, GeminiFileData, GeminiPart};
use crate::types::{ContentPart, Media, MediaSource};

/// Format a content part for Gemini
///
/// Images, PDFs and audio share one envelope: inline data for bytes and
/// base64, a file reference for URLs.
pub fn format_part(part: &ContentPart) -> GeminiPart {
    match part {
        ContentPart::Text { text } => GeminiPart::text(text.clone()),
        ContentPart::Image(media) | ContentPart::Pdf(media) | ContentPart::Audio(media) => format_media(media),
        ContentPart::Other { kind, data } => {
            tracing::debug!(kind = %kind, "formatting unsupported content part as text");
            GeminiPart::text(super::stringify_unknown(kind, data))
        }
    }
}

fn format_media(media: &Media) -> GeminiPart {
    match (&media.source, super::inline_base64(&media.source)) {
        (MediaSource::Url(url), _) => GeminiPart {
            file_data: Some(GeminiFileData {
                mime_type: media.mime_type.clone(),
                file_uri: url.clone(),
            }),
            ..GeminiPart::default()
        },
        (_, data) => GeminiPart {
            inline_data: Some(GeminiBlob {
                mime_type: media.mime_type.clone(),
                data: data.unwrap_or_default().into_owned(),
            }),
            ..GeminiPart::default()
        },
    }
}
