//! Chat capability trait

use async_trait::async_trait;

use crate::error::LlmError;
use crate::types::{ChatMessage, ChatRequest, ChatResponse, Tool};

/// A remote chat model that may answer with text or with tool call requests.
///
/// The transport and encoding are owned by the implementor; the orchestrator
/// only needs `chat_request`.
#[async_trait]
pub trait ChatCapability: Send + Sync {
    /// Send a full request: conversation, advertised tools and tool choice.
    async fn chat_request(&self, request: ChatRequest) -> Result<ChatResponse, LlmError>;

    async fn chat_with_tools(
        &self,
        messages: Vec<ChatMessage>,
        tools: Option<Vec<Tool>>,
    ) -> Result<ChatResponse, LlmError> {
        let request = ChatRequest::new(messages).with_tools(tools.unwrap_or_default());
        self.chat_request(request).await
    }

    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<ChatResponse, LlmError> {
        self.chat_with_tools(messages, None).await
    }
}

#[async_trait]
impl<T: ChatCapability + ?Sized> ChatCapability for std::sync::Arc<T> {
    async fn chat_request(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        (**self).chat_request(request).await
    }
}
