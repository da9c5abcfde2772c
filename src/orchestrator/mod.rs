//! Orchestrator for two-stage tool calling.
//!
//! One run sends the conversation plus the registered tool schemas to the
//! model. If the model answers with tool calls, the assistant message is echoed
//! back verbatim, every call is resolved against the [`ToolRegistry`] and
//! executed locally, one `tool` message is appended per call in request order,
//! and the model is asked again for the final answer. A first response without
//! tool calls is returned as-is after a single remote call.
//!
//! # Example
//!
//! ```rust,ignore
//! use toolrelay::orchestrator::{Orchestrator, ToolFailurePolicy};
//!
//! let outcome = Orchestrator::new(&client, &registry)
//!     .failure_policy(ToolFailurePolicy::ReportToModel)
//!     .concurrent(true)
//!     .run("What's the weather like in San Francisco, Tokyo, and Paris?")
//!     .await?;
//! assert_eq!(outcome.remote_calls, 2);
//! ```
//!
//! [`ToolRegistry`]: crate::registry::ToolRegistry

mod dispatch;
mod exchange;
pub mod types;


pub use exchange::Orchestrator;
pub use types::{
    DispatchMode, ExchangeOutcome, ExchangeState, OrchestratorOptions, ToolFailurePolicy,
    ToolResultCallback,
};
