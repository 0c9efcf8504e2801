//! Vendor-agnostic conversation and response types.
//!
//! These are the framework-facing types providers translate into and out of
//! their native wire format. The history is always borrowed by the adapter
//! and never mutated.

use serde::{Deserialize, Serialize};

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single turn in a conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Tool calls issued by an assistant turn.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// For `Role::Tool` turns, the id of the call this result answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// A tool-result turn answering the call with the given id.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Raw JSON argument payload, exactly as emitted by the model.
    pub arguments: String,
}

/// A tool made available to the model for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's arguments.
    pub parameters: serde_json::Value,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
}

/// One part of a completed model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePart {
    Text { text: String },
    ToolCall(ToolCall),
}

/// The output of one completed request.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub parts: Vec<ResponsePart>,
    pub finish_reason: Option<FinishReason>,
}

impl ModelResponse {
    /// Concatenation of all text parts, in order.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            if let ResponsePart::Text { text } = part {
                out.push_str(text);
            }
        }
        out
    }

    /// Tool calls requested by this response, in order.
    pub fn tool_calls(&self) -> Vec<&ToolCall> {
        self.parts
            .iter()
            .filter_map(|p| match p {
                ResponsePart::ToolCall(call) => Some(call),
                _ => None,
            })
            .collect()
    }
}

/// Token usage for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl Usage {
    /// Accumulate usage from another request.
    pub fn add(&mut self, other: &Usage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// A canonical fragment of a streamed response.
///
/// Fragments arrive in provider emission order. Tool-call argument JSON
/// arrives in pieces; callers assemble per `index` (see
/// `xai_api::ChatStream::finish` for the reference aggregation).
#[derive(Debug, Clone)]
pub enum StreamEvent {
    TextDelta {
        text: String,
    },
    ToolCallDelta {
        /// Position of the tool call within the response.
        index: usize,
        /// Present on the first fragment of a call.
        id: Option<String>,
        /// Present on the first fragment of a call.
        name: Option<String>,
        /// Incremental slice of the JSON argument payload.
        arguments: String,
    },
    /// Terminal event of a normally-completing stream.
    Finished {
        reason: Option<FinishReason>,
        usage: Option<Usage>,
    },
}
