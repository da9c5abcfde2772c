//! # toolrelay - two-stage tool calling for chat-completion models
//!
//! toolrelay runs the classic function-calling round trip against a remote
//! chat model: the conversation and a set of tool schemas go out, the model
//! answers with tool invocation requests, the requested tools run locally, and
//! the results go back for a final natural-language answer.
//!
#![deny(unsafe_code)]

//! ## Features
//!
//! - **Explicit client**: the model backend is a value implementing [`ChatCapability`], passed by reference.
//! - **Tool registry**: name → handler mapping with JSON Schema argument validation.
//! - **Failure policy**: report tool failures back to the model, or abort the run.
//! - **Order preserving**: tool results are appended in request order, also when dispatched concurrently.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use toolrelay::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OpenAiClient::new_with_config(OpenAiConfig::from_env()?)?;
//!
//!     let mut registry = ToolRegistry::new();
//!     toolrelay::tools::weather::register(&mut registry)?;
//!
//!     let outcome = Orchestrator::new(&client, &registry)
//!         .run("What's the weather like in San Francisco, Tokyo, and Paris?")
//!         .await?;
//!     println!("{}", outcome.text().unwrap_or_default());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod orchestrator;
pub mod providers;
pub mod registry;
pub mod retry;
pub mod telemetry;
pub mod tools;
pub mod traits;
pub mod types;

pub use error::{LlmError, Result};
pub use traits::ChatCapability;

/// Common imports
pub mod prelude {
    pub use crate::error::{ExchangeStage, LlmError};
    pub use crate::orchestrator::{
        ExchangeOutcome, ExchangeState, Orchestrator, OrchestratorOptions, ToolFailurePolicy,
    };
    pub use crate::providers::openai::{OpenAiClient, OpenAiConfig};
    pub use crate::registry::{ToolHandler, ToolRegistry};
    pub use crate::retry::RetryPolicy;
    pub use crate::traits::ChatCapability;
    pub use crate::types::{
        ChatMessage, ChatRequest, ChatResponse, Conversation, FinishReason, MessageRole, Tool,
        ToolCall, ToolChoice, ToolResult, Usage,
    };
}
