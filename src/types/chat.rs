//! Chat message types

use serde::{Deserialize, Serialize};

use super::tools::{Tool, ToolCall, ToolChoice};

/// Message role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

/// Chat message
///
/// A single entry of a conversation. Assistant messages may carry the tool
/// calls requested by the model; tool messages carry the id and name of the
/// call they answer.
///
/// # Examples
///
/// ```rust
/// use toolrelay::types::ChatMessage;
///
/// let msg = ChatMessage::user("What's the weather like in Paris?");
/// let result = ChatMessage::tool_result("call_123", "get_current_weather", r#"{"temperature":"22"}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role
    pub role: MessageRole,
    /// Text content, absent for assistant messages that only request tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Tool calls requested by the model (assistant messages only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Id of the tool call this message answers (tool messages only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Name of the tool that produced this message (tool messages only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatMessage {
    fn with_role(role: MessageRole, content: Option<String>) -> Self {
        Self {
            role,
            content,
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    /// Creates a user message
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::with_role(MessageRole::User, Some(content.into()))
    }

    /// Creates a system message
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::with_role(MessageRole::System, Some(content.into()))
    }

    /// Creates an assistant message
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::with_role(MessageRole::Assistant, Some(content.into()))
    }

    /// Creates an assistant message that requests tool calls.
    ///
    /// An empty `tool_calls` list is stored as `None` so the message
    /// serializes like a plain assistant reply.
    pub fn assistant_with_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        let mut msg = Self::with_role(MessageRole::Assistant, content);
        if !tool_calls.is_empty() {
            msg.tool_calls = Some(tool_calls);
        }
        msg
    }

    /// Creates a tool result message correlated to `tool_call_id`.
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            role: MessageRole::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
            name: Some(tool_name.into()),
        }
    }

    /// Gets the text content of the message
    pub fn content_text(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Tool calls carried by this message (empty for non-assistant messages).
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.tool_calls.as_deref().unwrap_or_default()
    }
}

/// A single request to the remote model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Full conversation so far
    pub messages: Vec<ChatMessage>,
    /// Tools advertised to the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    /// Tool selection policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            tools: None,
            tool_choice: None,
        }
    }

    /// Advertise tools. An empty list advertises nothing.
    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = if tools.is_empty() { None } else { Some(tools) };
        self
    }

    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }
}
