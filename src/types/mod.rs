//! Core data types: conversation messages, tool schemas and model responses.

mod chat;
mod conversation;
mod response;
mod tools;

pub use chat::{ChatMessage, ChatRequest, MessageRole};
pub use conversation::Conversation;
pub use response::{ChatResponse, FinishReason, Usage};
pub use tools::{FunctionCall, Tool, ToolCall, ToolChoice, ToolFunction, ToolResult};
