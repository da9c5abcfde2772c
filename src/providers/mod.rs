//! Remote model backends.
//!
//! Every backend implements [`ChatCapability`](crate::traits::ChatCapability);
//! the orchestrator never depends on a concrete provider.

pub mod openai;

pub use openai::{OpenAiClient, OpenAiConfig};
