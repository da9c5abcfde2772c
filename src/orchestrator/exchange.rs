//! Two-stage exchange.
//!
//! Implements exactly one round: ask → tool-calls → tool exec → re-ask.
//! A first response without tool calls is already final.

use std::sync::Arc;
use std::time::Duration;

use super::dispatch::ToolDispatcher;
use super::types::{
    DispatchMode, ExchangeOutcome, ExchangeState, OrchestratorOptions, ToolFailurePolicy,
};
use crate::error::{ExchangeStage, LlmError};
use crate::registry::ToolRegistry;
use crate::retry::RetryPolicy;
use crate::traits::ChatCapability;
use crate::types::{
    ChatMessage, ChatRequest, ChatResponse, Conversation, ToolChoice, ToolResult, Usage,
};

/// Drives one two-stage exchange against an explicitly passed model client.
///
/// The orchestrator borrows both the model and the registry; neither is
/// mutated, so one registry can serve many orchestrators at once.
///
/// # Example
///
/// ```rust,ignore
/// use toolrelay::prelude::*;
///
/// let client = OpenAiClient::new(OpenAiConfig::from_env()?)?;
/// let mut registry = ToolRegistry::new();
/// toolrelay::tools::weather::register(&mut registry)?;
///
/// let outcome = Orchestrator::new(&client, &registry)
///     .remote_timeout(Duration::from_secs(30))
///     .run("What's the weather like in Tokyo?")
///     .await?;
/// println!("{}", outcome.text().unwrap_or_default());
/// ```
pub struct Orchestrator<'a, M: ?Sized> {
    model: &'a M,
    registry: &'a ToolRegistry,
    options: OrchestratorOptions,
}

impl<'a, M> Orchestrator<'a, M>
where
    M: ChatCapability + ?Sized,
{
    pub fn new(model: &'a M, registry: &'a ToolRegistry) -> Self {
        Self {
            model,
            registry,
            options: OrchestratorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: OrchestratorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// Tool selection policy for the first call.
    pub fn tool_choice(mut self, choice: ToolChoice) -> Self {
        self.options.tool_choice = choice;
        self
    }

    pub fn failure_policy(mut self, policy: ToolFailurePolicy) -> Self {
        self.options.failure_policy = policy;
        self
    }

    /// Run the tool batch concurrently (results keep request order).
    pub fn concurrent(mut self, enabled: bool) -> Self {
        self.options.dispatch = if enabled {
            DispatchMode::Concurrent
        } else {
            DispatchMode::Sequential
        };
        self
    }

    pub fn remote_timeout(mut self, timeout: Duration) -> Self {
        self.options.remote_timeout = Some(timeout);
        self
    }

    pub fn tool_timeout(mut self, timeout: Duration) -> Self {
        self.options.tool_timeout = Some(timeout);
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.options.retry = Some(policy);
        self
    }

    pub fn on_tool_result<F>(mut self, cb: F) -> Self
    where
        F: Fn(&ToolResult) + Send + Sync + 'static,
    {
        self.options.on_tool_result = Some(Arc::new(cb));
        self
    }

    /// Run an exchange starting from a single user message.
    pub async fn run(&self, prompt: impl Into<String>) -> Result<ExchangeOutcome, LlmError> {
        self.run_conversation(Conversation::from_user(prompt)).await
    }

    /// Run an exchange starting from an existing conversation.
    #[tracing::instrument(
        name = "exchange",
        skip_all,
        fields(run_id = %uuid::Uuid::new_v4(), tools = self.registry.len())
    )]
    pub async fn run_conversation(
        &self,
        mut conversation: Conversation,
    ) -> Result<ExchangeOutcome, LlmError> {
        if conversation.is_empty() {
            return Err(LlmError::InvalidParameter(
                "conversation must contain at least one message".to_string(),
            ));
        }
        let mut states = vec![ExchangeState::Initial];

        let mut first_request = ChatRequest::new(conversation.messages().to_vec())
            .with_tools(self.registry.schemas().to_vec());
        if first_request.tools.is_some() {
            first_request = first_request.with_tool_choice(self.options.tool_choice.clone());
        }

        tracing::info!(messages = conversation.len(), "first call");
        let first = self
            .remote_call(ExchangeStage::FirstCall, first_request)
            .await?;

        if !first.has_tool_calls() {
            tracing::info!("no tool calls requested, response is final");
            conversation.push(first.to_assistant_message());
            states.push(ExchangeState::Finalized);
            let usage = first.usage;
            return Ok(ExchangeOutcome {
                response: first,
                conversation,
                tool_results: Vec::new(),
                remote_calls: 1,
                states,
                usage,
            });
        }

        states.push(ExchangeState::AwaitingToolResolution);
        // The model only accepts tool results after its own tool-call message.
        conversation.push(first.to_assistant_message());

        tracing::info!(calls = first.tool_calls.len(), "resolving tool calls");
        let dispatcher = ToolDispatcher::new(self.registry, &self.options);
        let tool_results = dispatcher.dispatch(&first.tool_calls).await?;
        for result in &tool_results {
            if let Some(cb) = &self.options.on_tool_result {
                cb(result);
            }
            conversation.push(result.to_message());
        }

        tracing::info!(messages = conversation.len(), "second call");
        let second_request = ChatRequest::new(conversation.messages().to_vec());
        let second = self
            .remote_call(ExchangeStage::SecondCall, second_request)
            .await?;

        if second.has_tool_calls() {
            tracing::warn!(
                calls = second.tool_calls.len(),
                "final response requested more tools; they are not executed"
            );
        }
        conversation.push(ChatMessage::assistant_with_tool_calls(
            second.content.clone(),
            Vec::new(),
        ));
        states.push(ExchangeState::Finalized);

        let usage = Usage::merge([first.usage.as_ref(), second.usage.as_ref()]);
        Ok(ExchangeOutcome {
            response: second,
            conversation,
            tool_results,
            remote_calls: 2,
            states,
            usage,
        })
    }

    async fn remote_call(
        &self,
        stage: ExchangeStage,
        request: ChatRequest,
    ) -> Result<ChatResponse, LlmError> {
        let none = RetryPolicy::none();
        let policy = self.options.retry.as_ref().unwrap_or(&none);
        policy
            .run(stage, || {
                let request = request.clone();
                async move { self.call_once(request).await }
            })
            .await
    }

    async fn call_once(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        match self.options.remote_timeout {
            Some(limit) => tokio::time::timeout(limit, self.model.chat_request(request))
                .await
                .map_err(|_| {
                    LlmError::TimeoutError(format!("remote call did not finish within {limit:?}"))
                })?,
            None => self.model.chat_request(request).await,
        }
    }
}
