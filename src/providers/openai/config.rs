//! `OpenAI` backend configuration

use std::fmt;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::LlmError;

/// Default endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo-1106";
/// Default HTTP timeout for a single request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// `OpenAI` configuration
#[derive(Clone)]
pub struct OpenAiConfig {
    /// API key (kept out of `Debug` output)
    pub api_key: SecretString,
    /// Base URL, without the trailing `/chat/completions`
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// Optional `OpenAI-Organization` header
    pub organization: Option<String>,
    /// HTTP timeout applied by the underlying client
    pub timeout: Duration,
    /// Sampling temperature
    pub temperature: Option<f32>,
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("has_organization", &self.organization.is_some())
            .field("timeout", &self.timeout)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

impl OpenAiConfig {
    /// Create a new configuration with the default endpoint and model.
    pub fn new<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            organization: None,
            timeout: DEFAULT_TIMEOUT,
            temperature: None,
        }
    }

    /// Build a configuration from the environment.
    ///
    /// `OPENAI_API_KEY` is required; `OPENAI_BASE_URL`, `OPENAI_MODEL` and
    /// `OPENAI_ORGANIZATION` override the defaults when set and non-empty.
    pub fn from_env() -> Result<Self, LlmError> {
        let api_key = env_non_empty("OPENAI_API_KEY").ok_or_else(|| {
            LlmError::MissingApiKey("OpenAI API key not provided (set OPENAI_API_KEY)".to_string())
        })?;

        let mut config = Self::new(api_key);
        if let Some(base_url) = env_non_empty("OPENAI_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        if let Some(model) = env_non_empty("OPENAI_MODEL") {
            config = config.with_model(model);
        }
        if let Some(org) = env_non_empty("OPENAI_ORGANIZATION") {
            config = config.with_organization(org);
        }
        Ok(config)
    }

    /// Set the base URL. A trailing slash is removed.
    pub fn with_base_url<S: AsRef<str>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.as_ref().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_organization<S: Into<String>>(mut self, organization: S) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Chat completions endpoint.
    pub fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Check the configuration before building a client.
    pub fn validate(&self) -> Result<(), LlmError> {
        if self.model.trim().is_empty() {
            return Err(LlmError::ConfigurationError(
                "model must not be empty".to_string(),
            ));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(LlmError::ConfigurationError(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(LlmError::ConfigurationError(format!(
                    "temperature must be within 0.0..=2.0, got {t}"
                )));
            }
        }
        Ok(())
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
