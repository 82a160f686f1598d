//! Conversion between internal types and Gemini wire format

use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::error::ProviderError;
use crate::format;
use crate::protocol::gemini::{
    GeminiCandidate, GeminiContent, GeminiFunctionCall, GeminiFunctionDeclaration, GeminiFunctionResponse,
    GeminiGenerationConfig, GeminiPart, GeminiRequest, GeminiResponse, GeminiTool, GeminiUsageMetadata,
};
use crate::provider::CallContext;
use crate::types::{
    CompletionRequest, Content, FinishReason, Message, NormalizedResponse, Role, StreamDelta, ToolCall, ToolCallDelta,
    Usage,
};

// -- Outbound: internal request -> Gemini wire request --

impl From<&CompletionRequest> for GeminiRequest {
    fn from(req: &CompletionRequest) -> Self {
        let tools = (!req.tools.is_empty()).then(|| {
            vec![GeminiTool {
                function_declarations: req
                    .tools
                    .iter()
                    .map(|t| GeminiFunctionDeclaration {
                        name: t.name.clone(),
                        description: t.description.clone(),
                        parameters: t.parameters.clone(),
                    })
                    .collect(),
            }]
        });

        Self {
            contents: req.messages.iter().map(Into::into).collect(),
            generation_config: GeminiGenerationConfig {
                temperature: req.config.temperature,
                top_p: req.config.top_p,
                max_output_tokens: req.config.max_tokens,
                stop_sequences: req.config.stop.clone(),
            },
            tools,
        }
    }
}

impl From<&Message> for GeminiContent {
    fn from(msg: &Message) -> Self {
        Self {
            role: Some(format_role(msg.role).to_owned()),
            parts: format_parts(msg),
        }
    }
}

/// Gemini only knows "user" and "model"; system and tool turns ride as user
pub const fn format_role(role: Role) -> &'static str {
    match role {
        Role::Assistant => "model",
        Role::System | Role::User | Role::Tool => "user",
    }
}

fn format_parts(msg: &Message) -> Vec<GeminiPart> {
    // A single function call per turn; later calls in the same message are not representable
    if let Some(call) = msg.tool_calls.values().next() {
        return vec![GeminiPart {
            function_call: Some(GeminiFunctionCall {
                name: call.name.clone(),
                args: Value::Object(call.arguments.clone()),
            }),
            ..GeminiPart::default()
        }];
    }

    if let Some(tool_call_id) = &msg.tool_call_id {
        return vec![GeminiPart {
            function_response: Some(GeminiFunctionResponse {
                name: tool_call_id.clone(),
                response: json!({
                    "name": tool_call_id,
                    "content": msg.content.as_text(),
                }),
            }),
            ..GeminiPart::default()
        }];
    }

    match &msg.content {
        Content::Text(text) => vec![GeminiPart::text(text.clone())],
        Content::Parts(parts) => parts.iter().map(format::gemini::format_part).collect(),
    }
}

/// Build the JSON payload for a `generateContent` request
///
/// Extra parameters land in `generationConfig`, the only place Gemini
/// accepts sampling knobs.
pub fn build_payload(req: &CompletionRequest) -> Result<Map<String, Value>, ProviderError> {
    let wire: GeminiRequest = req.into();
    let mut body = super::to_object(&wire)?;

    if !req.config.extra.is_empty() {
        let mut generation_config = match body.remove("generationConfig") {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        super::merge_missing(&mut generation_config, &req.config.extra);
        body.insert("generationConfig".to_owned(), Value::Object(generation_config));
    }

    Ok(body)
}

/// Request path for a model, relative to the API base URL
pub fn request_path(model: &str, stream: bool) -> String {
    if stream {
        format!("models/{model}:streamGenerateContent?alt=sse")
    } else {
        format!("models/{model}:generateContent")
    }
}

/// Extract the model name from a request path such as
/// `models/gemini-2.0-flash:generateContent`
pub fn model_from_path(path: &str) -> Option<&str> {
    let (_, rest) = path.rsplit_once("models/")?;
    let model = rest.split([':', '?', '/']).next()?;
    (!model.is_empty()).then_some(model)
}

// -- Inbound: Gemini wire response -> internal types --

/// Parse a non-streaming response
///
/// Only the first candidate is used. When it contains a function call the
/// text is dropped and the first call becomes the only tool call.
pub fn parse_response(resp: GeminiResponse, ctx: &CallContext) -> Result<NormalizedResponse, ProviderError> {
    let model_id = resolve_model(resp.model_version.as_deref(), ctx);
    let usage = resp.usage_metadata.map(Usage::from).unwrap_or_default();

    let Some(candidate) = resp.candidates.into_iter().next() else {
        tracing::debug!(provider = %ctx.provider, model = %model_id, "response has no candidates");
        let mut message = Message::assistant(String::new());
        message.model_id = model_id;
        return Ok(NormalizedResponse::new(message, usage, None));
    };

    let finish_reason = candidate.finish_reason.as_deref().map(parse_finish_reason);

    let mut message = match candidate.parts().iter().find_map(|p| p.function_call.as_ref()) {
        Some(call) => {
            warn_if_undeclared(&call.name, ctx);
            let arguments = call_arguments(call)?;
            let id = Uuid::new_v4().to_string();
            Message::tool_invocation([ToolCall::new(id, call.name.clone(), arguments)])
        }
        None => Message::assistant(candidate_text(&candidate)),
    };
    message.model_id = model_id;

    let finish_reason = if message.is_tool_call() {
        Some(FinishReason::ToolCalls)
    } else {
        finish_reason
    };

    Ok(NormalizedResponse::new(message, usage, finish_reason))
}

fn resolve_model(model_version: Option<&str>, ctx: &CallContext) -> String {
    model_version
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| fallback_model(ctx))
        .to_owned()
}

/// Model embedded in the request path, else the requested one
pub fn fallback_model(ctx: &CallContext) -> &str {
    model_from_path(&ctx.path).unwrap_or(ctx.model.as_str())
}

fn candidate_text(candidate: &GeminiCandidate) -> String {
    candidate
        .parts()
        .iter()
        .filter(|p| p.thought != Some(true))
        .filter_map(|p| p.text.as_deref())
        .collect()
}

fn call_arguments(call: &GeminiFunctionCall) -> Result<Map<String, Value>, ProviderError> {
    match &call.args {
        Value::Object(map) => Ok(map.clone()),
        Value::Null => Ok(Map::new()),
        other => Err(ProviderError::malformed(format!(
            "arguments for tool '{}' are not a JSON object",
            call.name
        ))
        .with_raw(other.clone())),
    }
}

fn warn_if_undeclared(name: &str, ctx: &CallContext) {
    if !ctx.tools.iter().any(|t| t.name == name) {
        tracing::warn!(provider = %ctx.provider, tool = %name, "model called a function that was not declared");
    }
}

impl From<GeminiUsageMetadata> for Usage {
    fn from(usage: GeminiUsageMetadata) -> Self {
        Self {
            input_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
            total_tokens: usage.total_token_count,
        }
    }
}

// -- Stream conversion --

/// Convert one streamed `generateContent` response into a normalized delta
///
/// Gemini sends complete function calls. A chunk carrying one is treated the
/// way [`parse_response`] treats a candidate: its text is dropped and only
/// the first call is kept, with a fresh id and its full arguments.
pub fn chunk_to_delta(chunk: GeminiResponse, ctx: &CallContext) -> StreamDelta {
    let mut delta = StreamDelta {
        model_id: chunk.model_version.filter(|m| !m.is_empty()),
        usage: chunk.usage_metadata.map(Usage::from).unwrap_or_default(),
        ..StreamDelta::default()
    };

    let Some(candidate) = chunk.candidates.into_iter().next() else {
        return delta;
    };

    if let Some(call) = candidate.parts().iter().find_map(|p| p.function_call.as_ref()) {
        warn_if_undeclared(&call.name, ctx);
        let arguments = match &call.args {
            Value::Null => String::new(),
            args => args.to_string(),
        };
        delta.tool_calls.push(ToolCallDelta {
            index: 0,
            id: Some(Uuid::new_v4().to_string()),
            name: Some(call.name.clone()),
            arguments: Some(arguments),
        });
        delta.finish_reason = Some(FinishReason::ToolCalls);
        return delta;
    }

    let text = candidate_text(&candidate);
    if !text.is_empty() {
        delta.content = Some(text);
    }
    delta.finish_reason = candidate.finish_reason.as_deref().map(parse_finish_reason);
    delta
}

/// Parse a Gemini finish reason
fn parse_finish_reason(s: &str) -> FinishReason {
    match s {
        "STOP" => FinishReason::Stop,
        "MAX_TOKENS" => FinishReason::Length,
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII" => FinishReason::ContentFilter,
        other => FinishReason::Other(other.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::error::ErrorKind;
    use crate::stream::{StreamAggregator, StreamSnapshot};
    use crate::types::{ContentPart, GenerationConfig, MediaSource, ToolDefinition};

    fn request(messages: Vec<Message>) -> CompletionRequest {
        CompletionRequest::new(messages, GenerationConfig::new("gemini-2.0-flash").with_temperature(0.4))
    }

    fn context(tools: Vec<ToolDefinition>) -> CallContext {
        CallContext {
            provider: "gemini".to_owned(),
            model: "gemini-2.0-flash".to_owned(),
            path: request_path("gemini-2.0-flash", false),
            tools,
        }
    }

    fn parse(value: &Value, ctx: &CallContext) -> Result<NormalizedResponse, ProviderError> {
        parse_response(GeminiResponse::deserialize(value).unwrap(), ctx)
    }

    #[test]
    fn builds_text_payload() {
        let body = build_payload(&request(vec![Message::user("Hello")])).unwrap();
        assert_eq!(
            Value::Object(body),
            json!({
                "contents": [{"role": "user", "parts": [{"text": "Hello"}]}],
                "generationConfig": {"temperature": 0.4}
            })
        );
    }

    #[test]
    fn roles_collapse_to_user_and_model() {
        let body = build_payload(&request(vec![
            Message::system("Be terse"),
            Message::user("Hi"),
            Message::assistant("Hello"),
        ]))
        .unwrap();
        let roles: Vec<_> = body["contents"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, ["user", "user", "model"]);
    }

    #[test]
    fn tools_only_when_declared() {
        let body = build_payload(&request(vec![Message::user("Hi")])).unwrap();
        assert!(!body.contains_key("tools"));

        let req = request(vec![Message::user("Weather?")]).with_tools(vec![ToolDefinition::new(
            "get_weather",
            "Current weather",
            json!({"type": "object"}),
        )]);
        let body = build_payload(&req).unwrap();
        assert_eq!(body["tools"][0]["functionDeclarations"][0]["name"], "get_weather");
    }

    #[test]
    fn extra_goes_into_generation_config() {
        let mut req = request(vec![Message::user("Hi")]);
        req.config = req
            .config
            .with_extra("temperature", json!(1.9))
            .with_extra("candidateCount", json!(1));
        let body = build_payload(&req).unwrap();
        assert_eq!(body["generationConfig"], json!({"temperature": 0.4, "candidateCount": 1}));
        assert!(!body.contains_key("candidateCount"));
    }

    #[test]
    fn tool_round_trip_parts() {
        let mut args = Map::new();
        args.insert("city".to_owned(), json!("Oslo"));
        let body = build_payload(&request(vec![
            Message::tool_invocation([ToolCall::new("call_1", "get_weather", args)]),
            Message::tool_result("call_1", "sunny"),
        ]))
        .unwrap();

        assert_eq!(
            body["contents"][0],
            json!({"role": "model", "parts": [{"functionCall": {"name": "get_weather", "args": {"city": "Oslo"}}}]})
        );
        assert_eq!(
            body["contents"][1],
            json!({"role": "user", "parts": [{"functionResponse": {
                "name": "call_1",
                "response": {"name": "call_1", "content": "sunny"}
            }}]})
        );
    }

    #[test]
    fn multimodal_parts_use_formatter() {
        let msg = Message::user(vec![
            ContentPart::text("Describe"),
            ContentPart::image(MediaSource::Base64("aGk=".to_owned()), "image/png"),
        ]);
        let body = build_payload(&request(vec![msg])).unwrap();
        assert_eq!(
            body["contents"][0]["parts"],
            json!([{"text": "Describe"}, {"inlineData": {"mimeType": "image/png", "data": "aGk="}}])
        );
    }

    #[test]
    fn paths_per_mode() {
        assert_eq!(request_path("gemini-pro", false), "models/gemini-pro:generateContent");
        assert_eq!(request_path("gemini-pro", true), "models/gemini-pro:streamGenerateContent?alt=sse");
    }

    #[test]
    fn model_parsed_from_path() {
        assert_eq!(model_from_path("models/gemini-1.5-pro:generateContent"), Some("gemini-1.5-pro"));
        assert_eq!(
            model_from_path("/v1beta/models/gemini-2.0-flash:streamGenerateContent?alt=sse"),
            Some("gemini-2.0-flash")
        );
        assert_eq!(model_from_path("chat/completions"), None);
    }

    #[test]
    fn parses_text_response() {
        let resp = parse(
            &json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Hel"}, {"text": "lo"}]},
                    "finishReason": "STOP",
                    "index": 0
                }],
                "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5, "totalTokenCount": 15},
                "modelVersion": "gemini-2.0-flash-001"
            }),
            &context(Vec::new()),
        )
        .unwrap();

        assert_eq!(resp.content(), "Hello");
        assert_eq!(resp.message.input_tokens, Some(10));
        assert_eq!(resp.message.output_tokens, Some(5));
        assert_eq!(resp.usage.total_tokens, Some(15));
        assert_eq!(resp.message.model_id, "gemini-2.0-flash-001");
        assert_eq!(resp.finish_reason, Some(FinishReason::Stop));
    }

    #[test]
    fn function_call_replaces_text() {
        let ctx = context(vec![ToolDefinition::new("get_weather", "Weather", json!({}))]);
        let resp = parse(
            &json!({
                "candidates": [{"content": {"role": "model", "parts": [
                    {"text": "Let me check."},
                    {"functionCall": {"name": "get_weather", "args": {"city": "Paris"}}},
                    {"functionCall": {"name": "get_time", "args": {}}}
                ]}}]
            }),
            &ctx,
        )
        .unwrap();

        assert_eq!(resp.content(), "");
        assert_eq!(resp.message.tool_calls.len(), 1);
        let call = resp.message.tool_calls.values().next().unwrap();
        assert_eq!(call.name, "get_weather");
        assert_eq!(call.arguments["city"], "Paris");
        assert!(Uuid::parse_str(&call.id).is_ok());
        assert_eq!(resp.finish_reason, Some(FinishReason::ToolCalls));
    }

    #[test]
    fn undeclared_function_is_still_returned() {
        let resp = parse(
            &json!({"candidates": [{"content": {"parts": [{"functionCall": {"name": "mystery"}}]}}]}),
            &context(Vec::new()),
        )
        .unwrap();
        let call = resp.message.tool_calls.values().next().unwrap();
        assert_eq!(call.name, "mystery");
        assert!(call.arguments.is_empty());
    }

    #[test]
    fn non_object_function_args_are_malformed() {
        let err = parse(
            &json!({"candidates": [{"content": {"parts": [{"functionCall": {"name": "f", "args": [1]}}]}}]}),
            &context(Vec::new()),
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Malformed);
    }

    #[test]
    fn zero_candidates_is_empty_message() {
        let resp = parse(&json!({"candidates": []}), &context(Vec::new())).unwrap();
        assert_eq!(resp.content(), "");
        assert!(resp.message.tool_calls.is_empty());
        assert_eq!(resp.message.input_tokens, None);
    }

    #[test]
    fn model_falls_back_to_path_then_context() {
        let resp = parse(&json!({"candidates": []}), &context(Vec::new())).unwrap();
        assert_eq!(resp.message.model_id, "gemini-2.0-flash");

        let mut ctx = context(Vec::new());
        ctx.path = "custom-endpoint".to_owned();
        ctx.model = "from-context".to_owned();
        let resp = parse(&json!({}), &ctx).unwrap();
        assert_eq!(resp.message.model_id, "from-context");
    }

    #[test]
    fn thought_parts_are_not_content() {
        let resp = parse(
            &json!({"candidates": [{"content": {"parts": [
                {"text": "thinking...", "thought": true},
                {"text": "Answer"}
            ]}}]}),
            &context(Vec::new()),
        )
        .unwrap();
        assert_eq!(resp.content(), "Answer");
    }

    #[test]
    fn safety_stop_is_content_filter() {
        let resp = parse(
            &json!({"candidates": [{"finishReason": "SAFETY"}]}),
            &context(Vec::new()),
        )
        .unwrap();
        assert_eq!(resp.finish_reason, Some(FinishReason::ContentFilter));
        assert_eq!(resp.content(), "");
    }

    #[test]
    fn stream_chunk_carries_text_and_usage() {
        let chunk = GeminiResponse::deserialize(&json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "Hi"}]}}],
            "usageMetadata": {"promptTokenCount": 3}
        }))
        .unwrap();
        let delta = chunk_to_delta(chunk, &context(Vec::new()));
        assert_eq!(delta.content.as_deref(), Some("Hi"));
        assert_eq!(delta.usage.input_tokens, Some(3));
        assert_eq!(delta.usage.output_tokens, None);
        assert!(delta.tool_calls.is_empty());
    }

    #[test]
    fn stream_chunk_keeps_first_function_call_only() {
        let chunk = GeminiResponse::deserialize(&json!({
            "candidates": [{"content": {"parts": [
                {"text": "Let me check."},
                {"functionCall": {"name": "a", "args": {"x": 1}}},
                {"functionCall": {"name": "b"}}
            ]}, "finishReason": "STOP"}]
        }))
        .unwrap();
        let delta = chunk_to_delta(chunk, &context(Vec::new()));
        assert_eq!(delta.content, None);
        assert_eq!(delta.tool_calls.len(), 1);
        assert_eq!(delta.tool_calls[0].name.as_deref(), Some("a"));
        assert_eq!(delta.tool_calls[0].arguments.as_deref(), Some(r#"{"x":1}"#));
        assert_eq!(delta.finish_reason, Some(FinishReason::ToolCalls));
    }

    #[test]
    fn separate_function_call_chunks_get_fresh_ids() {
        let ctx = context(Vec::new());
        let first = chunk_to_delta(
            GeminiResponse::deserialize(&json!({"candidates": [{"content": {"parts": [
                {"functionCall": {"name": "a"}}
            ]}}]}))
            .unwrap(),
            &ctx,
        );
        let second = chunk_to_delta(
            GeminiResponse::deserialize(&json!({"candidates": [{"content": {"parts": [
                {"functionCall": {"name": "b"}}
            ]}}]}))
            .unwrap(),
            &ctx,
        );
        assert_eq!(first.tool_calls[0].arguments.as_deref(), Some(""));
        assert_ne!(first.tool_calls[0].id, second.tool_calls[0].id);
    }

    fn stream(bodies: &[Value], ctx: &CallContext) -> NormalizedResponse {
        let mut aggregator = StreamAggregator::new(ctx, |_: &StreamSnapshot<'_>| {});
        for body in bodies {
            let chunk = GeminiResponse::deserialize(body).unwrap();
            aggregator.push_chunk(chunk_to_delta(chunk, ctx)).unwrap();
        }
        aggregator.finalize().unwrap()
    }

    #[test]
    fn streamed_function_call_matches_batch() {
        let ctx = context(vec![ToolDefinition::new("get_weather", "Weather", json!({}))]);
        let body = json!({
            "candidates": [{"content": {"role": "model", "parts": [
                {"text": "Let me check."},
                {"functionCall": {"name": "get_weather", "args": {"city": "Paris"}}},
                {"functionCall": {"name": "get_time", "args": {}}}
            ]}, "finishReason": "STOP"}],
            "usageMetadata": {"promptTokenCount": 8, "candidatesTokenCount": 3, "totalTokenCount": 11},
            "modelVersion": "gemini-2.0-flash-001"
        });

        let batch = parse(&body, &ctx).unwrap();
        let streamed = stream(&[body], &ctx);

        assert_eq!(streamed.content(), batch.content());
        assert_eq!(streamed.finish_reason, batch.finish_reason);
        assert_eq!(streamed.usage, batch.usage);
        assert_eq!(streamed.message.model_id, batch.message.model_id);

        let summary = |resp: &NormalizedResponse| -> Vec<(String, Map<String, Value>)> {
            resp.message
                .tool_calls
                .values()
                .map(|c| (c.name.clone(), c.arguments.clone()))
                .collect()
        };
        assert_eq!(summary(&streamed), summary(&batch));
        assert_eq!(summary(&batch).len(), 1);
    }

    #[test]
    fn streamed_text_matches_batch() {
        let ctx = context(Vec::new());
        let body = json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "Hel"}, {"text": "lo"}]},
                "finishReason": "STOP"}],
            "usageMetadata": {"promptTokenCount": 2, "candidatesTokenCount": 1, "totalTokenCount": 3}
        });

        let batch = parse(&body, &ctx).unwrap();
        let streamed = stream(&[body], &ctx);
        assert_eq!(streamed.content(), batch.content());
        assert_eq!(streamed.finish_reason, batch.finish_reason);
        assert_eq!(streamed.usage, batch.usage);
    }

    #[test]
    fn plain_text_conversation_echo_round_trip() {
        let req = request(vec![
            Message::system("Repeat the last message"),
            Message::user("first"),
            Message::assistant("first"),
            Message::user("What is 2 + 2?"),
        ]);
        let body = build_payload(&req).unwrap();
        let last = body["contents"].as_array().unwrap().last().unwrap().clone();

        let echo = json!({"candidates": [{"content": {"role": "model", "parts": last["parts"]}}]});
        let resp = parse(&echo, &context(Vec::new())).unwrap();
        assert_eq!(resp.content(), "What is 2 + 2?");
    }
}
