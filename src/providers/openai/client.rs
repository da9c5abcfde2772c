//! `OpenAI` Client Implementation

use async_trait::async_trait;
use secrecy::ExposeSecret;

use super::config::OpenAiConfig;
use super::transformers::{build_request_body, map_error_response, parse_response};
use crate::error::LlmError;
use crate::traits::ChatCapability;
use crate::types::{ChatRequest, ChatResponse};

/// `OpenAI` Client
#[derive(Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("provider_name", &"openai")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .field("temperature", &self.config.temperature)
            .finish()
    }
}

impl OpenAiClient {
    /// Creates a new `OpenAI` client with configuration and HTTP client
    pub fn new(config: OpenAiConfig, http_client: reqwest::Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    /// Creates a new client with an HTTP client built from the configured timeout.
    pub fn new_with_config(config: OpenAiConfig) -> Result<Self, LlmError> {
        config.validate()?;
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::ConfigurationError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::new(config, http_client))
    }

    /// Creates a client from `OPENAI_*` environment variables.
    pub fn from_env() -> Result<Self, LlmError> {
        Self::new_with_config(OpenAiConfig::from_env()?)
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl ChatCapability for OpenAiClient {
    async fn chat_request(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        let body = build_request_body(&self.config, &request)?;
        let url = self.config.chat_url();
        tracing::debug!(
            url = %url,
            model = %self.config.model,
            messages = request.messages.len(),
            tools = request.tools.as_ref().map_or(0, Vec::len),
            "sending chat completion request"
        );

        let mut builder = self
            .http_client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body);
        if let Some(org) = &self.config.organization {
            builder = builder.header("OpenAI-Organization", org);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let err = map_error_response(status.as_u16(), &text);
            tracing::debug!(status = status.as_u16(), error = %err, "chat completion failed");
            return Err(err);
        }

        let parsed = parse_response(&text)?;
        tracing::debug!(
            tool_calls = parsed.tool_calls.len(),
            finish_reason = ?parsed.finish_reason,
            "chat completion received"
        );
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_does_not_leak_key() {
        let client = OpenAiClient::new_with_config(OpenAiConfig::new("sk-hidden")).unwrap();
        let dbg = format!("{client:?}");
        assert!(!dbg.contains("sk-hidden"));
        assert!(dbg.contains("openai"));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = OpenAiClient::new_with_config(OpenAiConfig::new("k").with_model("")).unwrap_err();
        assert!(matches!(err, LlmError::ConfigurationError(_)));
    }
}
