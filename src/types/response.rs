//! Model response types

use serde::{Deserialize, Serialize};

use super::chat::ChatMessage;
use super::tools::ToolCall;

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    #[serde(untagged)]
    Other(String),
}

impl FinishReason {
    pub fn from_wire(s: &str) -> Self {
        match s {
            "stop" => Self::Stop,
            "length" => Self::Length,
            "tool_calls" | "function_call" => Self::ToolCalls,
            "content_filter" => Self::ContentFilter,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Token usage reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }

    /// Sum usage across calls; `None` entries are skipped. Counts saturate at `u32::MAX`.
    pub fn merge<'a>(items: impl IntoIterator<Item = Option<&'a Usage>>) -> Option<Usage> {
        items.into_iter().flatten().fold(None, |acc, u| {
            let mut total = acc.unwrap_or_default();
            total.prompt_tokens = total.prompt_tokens.saturating_add(u.prompt_tokens);
            total.completion_tokens = total.completion_tokens.saturating_add(u.completion_tokens);
            total.total_tokens = total.total_tokens.saturating_add(u.total_tokens);
            Some(total)
        })
    }
}

/// Response of a single remote model call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Assistant text, absent when the model only requested tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Tool invocations requested by the model, in the order received
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ChatResponse {
    /// Plain text response
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            finish_reason: Some(FinishReason::Stop),
            ..Default::default()
        }
    }

    /// Response that requests tool calls
    pub fn with_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            finish_reason: Some(FinishReason::ToolCalls),
            ..Default::default()
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    pub fn content_text(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// The assistant message to echo back into the conversation, tool calls
    /// included verbatim.
    pub fn to_assistant_message(&self) -> ChatMessage {
        ChatMessage::assistant_with_tool_calls(self.content.clone(), self.tool_calls.clone())
    }
}
