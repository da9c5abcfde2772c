//! Core types for orchestrator module.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::retry::RetryPolicy;
use crate::types::{ChatResponse, Conversation, ToolChoice, ToolResult, Usage};

/// States of a single two-stage exchange. Transitions are linear:
/// `Initial → AwaitingToolResolution → Finalized`, or `Initial → Finalized`
/// when the first response requests no tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExchangeState {
    Initial,
    AwaitingToolResolution,
    Finalized,
}

/// What happens when a single requested tool call cannot be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolFailurePolicy {
    /// Append an error-content `tool` message for the failing call and keep
    /// going; the final model call sees the failure.
    #[default]
    ReportToModel,
    /// Stop the run and return the error, tagged with the call id and tool name.
    Abort,
}

/// How a batch of tool calls is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// One call after another, in request order.
    #[default]
    Sequential,
    /// All calls at once on the blocking pool; results are still appended in
    /// request order.
    Concurrent,
}

/// Callback invoked for every tool result, in request order.
pub type ToolResultCallback = Arc<dyn Fn(&ToolResult) + Send + Sync>;

/// Orchestrator options.
#[derive(Clone)]
pub struct OrchestratorOptions {
    /// Tool selection policy for the first call.
    pub tool_choice: ToolChoice,
    /// Policy for unknown tools, bad arguments and handler failures.
    pub failure_policy: ToolFailurePolicy,
    /// Batch execution mode.
    pub dispatch: DispatchMode,
    /// Deadline for each remote call attempt.
    pub remote_timeout: Option<Duration>,
    /// Deadline for each tool invocation.
    pub tool_timeout: Option<Duration>,
    /// Retry policy for transient remote failures. `None` performs a single attempt.
    pub retry: Option<RetryPolicy>,
    /// Optional per-result callback.
    pub on_tool_result: Option<ToolResultCallback>,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            tool_choice: ToolChoice::Auto,
            failure_policy: ToolFailurePolicy::ReportToModel,
            dispatch: DispatchMode::Sequential,
            remote_timeout: None,
            tool_timeout: None,
            retry: None,
            on_tool_result: None,
        }
    }
}

impl fmt::Debug for OrchestratorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrchestratorOptions")
            .field("tool_choice", &self.tool_choice)
            .field("failure_policy", &self.failure_policy)
            .field("dispatch", &self.dispatch)
            .field("remote_timeout", &self.remote_timeout)
            .field("tool_timeout", &self.tool_timeout)
            .field("retry", &self.retry)
            .field("has_on_tool_result", &self.on_tool_result.is_some())
            .finish()
    }
}

/// Result of a finished exchange.
#[derive(Debug, Clone)]
pub struct ExchangeOutcome {
    /// The final model response (second call, or the first when no tools were requested).
    pub response: ChatResponse,
    /// Full conversation, ending with the final assistant message.
    pub conversation: Conversation,
    /// Results of the executed batch, in request order.
    pub tool_results: Vec<ToolResult>,
    /// Number of remote calls that completed (1 or 2).
    pub remote_calls: usize,
    /// State transitions, starting with `Initial` and ending with `Finalized`.
    pub states: Vec<ExchangeState>,
    /// Usage summed over both remote calls.
    pub usage: Option<Usage>,
}

impl ExchangeOutcome {
    /// Final assistant text.
    pub fn text(&self) -> Option<&str> {
        self.response.content_text()
    }

    pub fn used_tools(&self) -> bool {
        self.states.contains(&ExchangeState::AwaitingToolResolution)
    }
}
