//! Conversion between the conversation model and provider wire formats
//!
//! Builders go from [`CompletionRequest`](crate::types::CompletionRequest) to
//! a JSON payload; parsers go from a decoded wire response or stream chunk to
//! normalized types.

pub mod gemini;
pub mod openai;

use serde_json::{Map, Value};

use crate::error::{ErrorKind, ProviderError};

/// Serialize a wire request into a JSON object
pub(crate) fn to_object<T: serde::Serialize>(wire: &T) -> Result<Map<String, Value>, ProviderError> {
    match serde_json::to_value(wire) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ProviderError::new(
            ErrorKind::InvalidRequest,
            format!("request payload is not a JSON object: {other}"),
        )),
        Err(e) => Err(ProviderError::new(
            ErrorKind::InvalidRequest,
            format!("failed to serialize request: {e}"),
        )),
    }
}

/// Copy `extra` keys into `target` without overwriting keys already present
pub(crate) fn merge_missing(target: &mut Map<String, Value>, extra: &Map<String, Value>) {
    for (key, value) in extra {
        if target.contains_key(key) {
            tracing::debug!(key = %key, "ignoring extra parameter that would overwrite a built field");
            continue;
        }
        target.insert(key.clone(), value.clone());
    }
}

/// Parse JSON-encoded tool arguments into an object
///
/// Empty text means "no arguments". Anything that is not a JSON object is
/// `Malformed`.
pub(crate) fn parse_arguments(tool: &str, raw: &str) -> Result<Map<String, Value>, ProviderError> {
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ProviderError::malformed(format!(
            "arguments for tool '{tool}' are not a JSON object"
        ))
        .with_raw(other)),
        Err(e) => Err(ProviderError::malformed(format!(
            "arguments for tool '{tool}' are not valid JSON: {e}"
        ))
        .with_raw(Value::String(raw.to_owned()))),
    }
}

/// Decode raw stream data into JSON, surfacing in-band error envelopes
pub(crate) fn decode_chunk(data: &str) -> Result<Value, ProviderError> {
    let value: Value = serde_json::from_str(data).map_err(|e| {
        ProviderError::malformed(format!("stream chunk is not valid JSON: {e}")).with_raw(Value::String(data.to_owned()))
    })?;

    match crate::error::map_error_value(None, &value) {
        Some(error) => Err(error),
        None => Ok(value),
    }
}
