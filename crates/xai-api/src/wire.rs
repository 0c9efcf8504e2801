//! xAI chat-completions wire types and mapping to the shared model.
//!
//! The wire format is the OpenAI-compatible `/v1/chat/completions` schema.
//! Everything in this module is pure data transformation; no I/O.

use serde::{Deserialize, Serialize};
use xai_types::{
    ApiError, FinishReason, Message, ModelResponse, ModelSettings, ResponsePart, Role, StreamEvent,
    ToolCall, ToolDefinition, Usage,
};

/// Longest raw payload slice attached to a decode error.
const MAX_ERROR_PAYLOAD_BYTES: usize = 2048;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Body of a `POST /v1/chat/completions` request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_tool_calls: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<WireTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_options: Option<StreamOptions>,
}

/// One conversation turn in wire shape.
#[derive(Debug, Clone, Serialize)]
pub struct WireMessage {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: WireFunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireFunctionCall {
    pub name: String,
    /// JSON argument payload as a string, per the wire format.
    pub arguments: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WireTool {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: WireFunction,
}

#[derive(Debug, Clone, Serialize)]
pub struct WireFunction {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    Auto,
    Required,
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamOptions {
    pub include_usage: bool,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl From<WireUsage> for Usage {
    fn from(wire: WireUsage) -> Self {
        Usage {
            prompt_tokens: wire.prompt_tokens,
            completion_tokens: wire.completion_tokens,
            total_tokens: wire.total_tokens,
        }
    }
}

// ---------------------------------------------------------------------------
// Streaming chunk types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ChunkToolCall>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkToolCall {
    pub index: usize,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub function: Option<ChunkFunctionCall>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkFunctionCall {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

// ---------------------------------------------------------------------------
// Mapping: shared model -> wire
// ---------------------------------------------------------------------------

/// Build the wire request for one exchange.
///
/// `allow_text_result = false` forces a tool call (`tool_choice: "required"`);
/// with no tools configured, `tool_choice` is omitted entirely.
pub fn build_request(
    model: &str,
    messages: &[Message],
    settings: Option<&ModelSettings>,
    tools: &[ToolDefinition],
    allow_text_result: bool,
    stream: bool,
) -> ChatCompletionRequest {
    let wire_messages = messages.iter().map(map_message).collect();

    let (wire_tools, tool_choice) = if tools.is_empty() {
        (None, None)
    } else {
        let mapped = tools
            .iter()
            .map(|t| WireTool {
                tool_type: "function".to_string(),
                function: WireFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect();
        let choice = if allow_text_result {
            ToolChoice::Auto
        } else {
            ToolChoice::Required
        };
        (Some(mapped), Some(choice))
    };

    ChatCompletionRequest {
        model: model.to_string(),
        messages: wire_messages,
        temperature: settings.and_then(|s| s.temperature),
        top_p: settings.and_then(|s| s.top_p),
        max_tokens: settings.and_then(|s| s.max_tokens),
        stop: settings.and_then(|s| s.stop.clone()),
        seed: settings.and_then(|s| s.seed),
        parallel_tool_calls: settings.and_then(|s| s.parallel_tool_calls),
        tools: wire_tools,
        tool_choice,
        stream,
        // Without this the provider omits usage from streamed responses
        stream_options: stream.then_some(StreamOptions {
            include_usage: true,
        }),
    }
}

fn map_message(message: &Message) -> WireMessage {
    let tool_calls = if message.tool_calls.is_empty() {
        None
    } else {
        Some(
            message
                .tool_calls
                .iter()
                .map(|call| WireToolCall {
                    id: call.id.clone(),
                    call_type: "function".to_string(),
                    function: WireFunctionCall {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    },
                })
                .collect(),
        )
    };

    // Assistant turns that only carry tool calls have no content field
    let content = if message.content.is_empty() && tool_calls.is_some() {
        None
    } else {
        Some(message.content.clone())
    };

    WireMessage {
        role: message.role,
        content,
        tool_calls,
        tool_call_id: message.tool_call_id.clone(),
    }
}

// ---------------------------------------------------------------------------
// Mapping: wire -> shared model
// ---------------------------------------------------------------------------

/// Decode a non-streaming response body into the shared model.
///
/// Any schema mismatch surfaces as [`ApiError::Decode`] carrying the raw
/// payload for diagnosis.
pub fn decode_response(body: &str) -> Result<(ModelResponse, Usage), ApiError> {
    let response: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| ApiError::Decode {
            message: e.to_string(),
            payload: truncate_payload(body),
        })?;

    let usage = response.usage.map(Usage::from).unwrap_or_default();

    let choice = response.choices.into_iter().next().ok_or(ApiError::Decode {
        message: "response contained no choices".to_string(),
        payload: truncate_payload(body),
    })?;

    let mut parts = Vec::new();
    match choice.message.content {
        Some(text) if !text.is_empty() => parts.push(ResponsePart::Text { text }),
        _ => {}
    }
    for call in choice.message.tool_calls {
        parts.push(ResponsePart::ToolCall(ToolCall {
            id: call.id,
            name: call.function.name,
            arguments: call.function.arguments,
        }));
    }

    let finish_reason = choice.finish_reason.as_deref().and_then(parse_finish_reason);

    Ok((
        ModelResponse {
            parts,
            finish_reason,
        },
        usage,
    ))
}

/// Map one streamed chunk into canonical events plus any terminal metadata.
pub fn chunk_events(
    chunk: ChatCompletionChunk,
) -> (Vec<StreamEvent>, Option<FinishReason>, Option<Usage>) {
    let mut events = Vec::new();
    let mut finish_reason = None;

    for choice in chunk.choices {
        match choice.delta.content {
            Some(text) if !text.is_empty() => events.push(StreamEvent::TextDelta { text }),
            _ => {}
        }
        for call in choice.delta.tool_calls {
            let (name, arguments) = match call.function {
                Some(f) => (f.name, f.arguments.unwrap_or_default()),
                None => (None, String::new()),
            };
            events.push(StreamEvent::ToolCallDelta {
                index: call.index,
                id: call.id,
                name,
                arguments,
            });
        }
        if let Some(reason) = choice.finish_reason.as_deref() {
            finish_reason = parse_finish_reason(reason);
        }
    }

    (events, finish_reason, chunk.usage.map(Usage::from))
}

fn parse_finish_reason(reason: &str) -> Option<FinishReason> {
    match reason {
        "stop" => Some(FinishReason::Stop),
        "length" => Some(FinishReason::Length),
        "tool_calls" => Some(FinishReason::ToolCalls),
        "content_filter" => Some(FinishReason::ContentFilter),
        other => {
            tracing::debug!("unknown finish_reason: {other}");
            None
        }
    }
}

/// Truncate a raw payload for inclusion in an error, never splitting a UTF-8
/// codepoint.
pub(crate) fn truncate_payload(s: &str) -> String {
    if s.len() <= MAX_ERROR_PAYLOAD_BYTES {
        return s.to_string();
    }
    let mut end = MAX_ERROR_PAYLOAD_BYTES;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}
