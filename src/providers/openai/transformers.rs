//! Mapping between the crate's chat types and the `OpenAI` wire format.

use serde_json::{Value, json};

use super::config::OpenAiConfig;
use super::types::{OpenAiChatRequest, OpenAiChatResponse, OpenAiErrorResponse};
use crate::error::LlmError;
use crate::types::{ChatRequest, ChatResponse, FinishReason, ToolChoice, Usage};

/// Wire form of a tool choice.
pub(crate) fn tool_choice_to_wire(choice: &ToolChoice) -> Value {
    match choice {
        ToolChoice::Auto => json!("auto"),
        ToolChoice::Required => json!("required"),
        ToolChoice::None => json!("none"),
        ToolChoice::Tool { name } => json!({
            "type": "function",
            "function": {"name": name}
        }),
    }
}

/// Build the request body. Tools and tool choice are only sent when tools
/// are advertised.
pub(crate) fn build_request_body(
    config: &OpenAiConfig,
    request: &ChatRequest,
) -> Result<Value, LlmError> {
    if request.messages.is_empty() {
        return Err(LlmError::InvalidParameter(
            "chat request must contain at least one message".to_string(),
        ));
    }
    let tools = request.tools.as_deref().filter(|t| !t.is_empty());
    let body = OpenAiChatRequest {
        model: &config.model,
        messages: &request.messages,
        tools,
        tool_choice: tools
            .and(request.tool_choice.as_ref())
            .map(tool_choice_to_wire),
        temperature: config.temperature,
    };
    Ok(serde_json::to_value(body)?)
}

/// Map a successful response body into a [`ChatResponse`] using the first choice.
pub(crate) fn parse_response(body: &str) -> Result<ChatResponse, LlmError> {
    let raw: OpenAiChatResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::ParseError(format!("invalid chat completion body: {e}")))?;

    let choice = raw
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::ParseError("chat completion has no choices".to_string()))?;

    let usage = raw.usage.map(|u| {
        let prompt = u.prompt_tokens.unwrap_or(0);
        let completion = u.completion_tokens.unwrap_or(0);
        Usage {
            prompt_tokens: prompt,
            completion_tokens: completion,
            total_tokens: u.total_tokens.unwrap_or(prompt.saturating_add(completion)),
        }
    });

    Ok(ChatResponse {
        id: raw.id,
        model: raw.model,
        content: choice.message.content,
        tool_calls: choice.message.tool_calls.unwrap_or_default(),
        finish_reason: choice.finish_reason.as_deref().map(FinishReason::from_wire),
        usage,
    })
}

/// Map a non-success status and body into an error.
pub(crate) fn map_error_response(status: u16, body: &str) -> LlmError {
    let parsed = serde_json::from_str::<OpenAiErrorResponse>(body).ok();
    let message = parsed
        .as_ref()
        .map(|e| e.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                body.trim().to_string()
            }
        });

    match status {
        401 | 403 => LlmError::AuthenticationError(message),
        429 => LlmError::RateLimitError(message),
        _ => LlmError::ApiError {
            code: status,
            message,
            details: serde_json::from_str::<Value>(body).ok(),
        },
    }
}
