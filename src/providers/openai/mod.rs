//! `OpenAI` chat-completions backend
//!
//! Sends the conversation and the advertised tools to
//! `{base_url}/chat/completions` and maps the first choice back into a
//! [`ChatResponse`](crate::types::ChatResponse). Any OpenAI-compatible server
//! works by pointing `base_url` at it.
//!
//! # Example
//!
//! ```rust,ignore
//! use toolrelay::providers::openai::{OpenAiClient, OpenAiConfig};
//!
//! let config = OpenAiConfig::new("sk-...").with_model("gpt-4o-mini");
//! let client = OpenAiClient::new_with_config(config)?;
//! ```

mod client;
mod config;
mod transformers;
pub mod types;

pub use client::OpenAiClient;
pub use config::OpenAiConfig;
