//! Tool calling and function definition types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::chat::{ChatMessage, MessageRole};
use crate::error::LlmError;

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Opaque call identifier assigned by the model
    pub id: String,
    /// Call type (always "function")
    #[serde(default = "function_type")]
    pub r#type: String,
    /// Requested function and its raw arguments
    pub function: FunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

impl ToolCall {
    /// Create a function tool call
    pub fn function(id: impl Into<String>, function: FunctionCall) -> Self {
        Self {
            id: id.into(),
            r#type: function_type(),
            function,
        }
    }

    /// Name of the requested tool
    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// Function name plus serialized argument payload, exactly as the model sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

/// Tool definition for function calling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool type (usually "function")
    pub r#type: String,
    /// Function definition
    pub function: ToolFunction,
}

impl Tool {
    /// Create a new function tool
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Self {
        Self {
            r#type: function_type(),
            function: ToolFunction {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }

    /// Tool name
    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// Tool function definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolFunction {
    /// Function name
    pub name: String,
    /// Function description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// JSON schema for function parameters
    pub parameters: Value,
}

/// Provider-agnostic tool choice strategy
///
/// - `Auto`: the model decides whether to call tools (default)
/// - `Required`: the model must call at least one tool
/// - `None`: the model may not call tools
/// - `Tool`: the model must call the named tool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    #[default]
    Auto,
    Required,
    None,
    #[serde(rename = "tool")]
    Tool { name: String },
}

impl ToolChoice {
    /// Create a tool choice that forces a specific tool
    pub fn tool(name: impl Into<String>) -> Self {
        Self::Tool { name: name.into() }
    }
}

/// Output of a local tool execution, correlated to the originating call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub call_id: String,
    pub tool_name: String,
    pub output: Value,
    /// Set when `output` is a synthesized error payload. Not carried by the
    /// wire message.
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(call_id: impl Into<String>, tool_name: impl Into<String>, output: Value) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            output,
            is_error: false,
        }
    }

    /// Error placeholder: `{"error": <kind>, "message": <message>}`.
    pub fn error(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        kind: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            output: serde_json::json!({ "error": kind, "message": message.into() }),
            is_error: true,
        }
    }

    /// Wrap into a `tool` role message. Content is the compact JSON text of the output.
    pub fn to_message(&self) -> ChatMessage {
        ChatMessage::tool_result(
            self.call_id.clone(),
            self.tool_name.clone(),
            self.output.to_string(),
        )
    }

    /// Parse a `tool` role message back into a result.
    ///
    /// Recovers the call id, tool name and output. Content that is not valid
    /// JSON is kept as a JSON string. `is_error` is always `false`: a handler
    /// may legitimately return an object shaped like an error payload.
    pub fn from_message(message: &ChatMessage) -> Result<Self, LlmError> {
        if message.role != MessageRole::Tool {
            return Err(LlmError::ParseError(format!(
                "expected a tool message, got {:?}",
                message.role
            )));
        }
        let call_id = message
            .tool_call_id
            .clone()
            .ok_or_else(|| LlmError::ParseError("tool message without tool_call_id".into()))?;
        let tool_name = message.name.clone().unwrap_or_default();
        let content = message.content.as_deref().unwrap_or_default();
        let output = serde_json::from_str(content)
            .unwrap_or_else(|_| Value::String(content.to_string()));
        Ok(Self::success(call_id, tool_name, output))
    }
}
