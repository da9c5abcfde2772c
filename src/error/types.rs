//! Core error types.

use std::fmt;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LlmError>;

/// The point of a two-stage exchange at which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExchangeStage {
    /// The first remote call (conversation + tool schemas).
    FirstCall,
    /// Resolving, parsing or executing a requested tool invocation.
    ToolResolution,
    /// The second remote call that produces the final answer.
    SecondCall,
}

impl fmt::Display for ExchangeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::FirstCall => "first call",
            Self::ToolResolution => "tool resolution",
            Self::SecondCall => "second call",
        };
        f.write_str(s)
    }
}

/// Coarse error category, mainly used for retry decisions and presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Authentication,
    RateLimit,
    Client,
    Server,
    Parsing,
    Validation,
    Tool,
    Configuration,
    Unknown,
}

/// Errors produced by the model backend, the tool registry and the orchestrator.
#[derive(Error, Debug, Clone)]
pub enum LlmError {
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Connection could not be established
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Request or tool invocation exceeded its deadline
    #[error("Timeout error: {0}")]
    TimeoutError(String),

    /// Non-success response from the provider API
    #[error("API error {code}: {message}")]
    ApiError {
        code: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Credentials were rejected
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The provider throttled the request
    #[error("Rate limit exceeded: {0}")]
    RateLimitError(String),

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    JsonError(String),

    /// Provider response did not have the expected shape
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// API key was not provided
    #[error("Missing API key: {0}")]
    MissingApiKey(String),

    /// Invalid argument passed to a library function
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A tool with the same name was already registered
    #[error("Tool '{name}' is already registered")]
    DuplicateTool { name: String },

    /// The model requested a tool the registry does not know about
    #[error("Unknown tool '{name}'")]
    UnknownTool { name: String },

    /// The argument payload of a tool call is malformed or violates the tool schema
    #[error("Invalid arguments for tool '{tool_name}': {reason}")]
    ArgumentParse { tool_name: String, reason: String },

    /// A tool handler returned an error
    #[error("Tool '{tool_name}' failed: {message}")]
    ToolExecutionError { tool_name: String, message: String },

    /// Failure wrapped with the exchange stage it occurred in
    #[error("{stage} failed{}: {source}", describe_call(.tool_name.as_deref(), .call_id.as_deref()))]
    Stage {
        stage: ExchangeStage,
        tool_name: Option<String>,
        call_id: Option<String>,
        #[source]
        source: Box<LlmError>,
    },

    /// Internal invariant violation
    #[error("Internal error: {0}")]
    InternalError(String),
}

fn describe_call(tool_name: Option<&str>, call_id: Option<&str>) -> String {
    match (tool_name, call_id) {
        (Some(t), Some(c)) => format!(" (tool '{t}', call '{c}')"),
        (Some(t), None) => format!(" (tool '{t}')"),
        (None, Some(c)) => format!(" (call '{c}')"),
        (None, None) => String::new(),
    }
}

impl LlmError {
    /// Create an API error without details.
    pub fn api_error(code: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Wrap this error with the stage of the exchange it occurred in.
    pub fn at_stage(self, stage: ExchangeStage) -> Self {
        Self::Stage {
            stage,
            tool_name: None,
            call_id: None,
            source: Box::new(self),
        }
    }

    /// Wrap this error with the tool resolution stage and the failing call.
    pub fn at_tool_call(self, tool_name: impl Into<String>, call_id: impl Into<String>) -> Self {
        Self::Stage {
            stage: ExchangeStage::ToolResolution,
            tool_name: Some(tool_name.into()),
            call_id: Some(call_id.into()),
            source: Box::new(self),
        }
    }

    /// Stage of the exchange this error was tagged with, if any.
    pub fn stage(&self) -> Option<ExchangeStage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Innermost error, with any stage wrapping removed.
    pub fn root(&self) -> &LlmError {
        match self {
            Self::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// HTTP status code, when the error originated from an HTTP response.
    pub fn status_code(&self) -> Option<u16> {
        match self.root() {
            Self::ApiError { code, .. } => Some(*code),
            Self::AuthenticationError(_) => Some(401),
            Self::RateLimitError(_) => Some(429),
            _ => None,
        }
    }

    /// Coarse category of the error.
    pub fn category(&self) -> ErrorCategory {
        match self.root() {
            Self::HttpError(_) | Self::ConnectionError(_) | Self::TimeoutError(_) => {
                ErrorCategory::Network
            }
            Self::AuthenticationError(_) | Self::MissingApiKey(_) => ErrorCategory::Authentication,
            Self::RateLimitError(_) => ErrorCategory::RateLimit,
            Self::ApiError { code, .. } if *code >= 500 => ErrorCategory::Server,
            Self::ApiError { code: 429, .. } => ErrorCategory::RateLimit,
            Self::ApiError { code: 401 | 403, .. } => ErrorCategory::Authentication,
            Self::ApiError { .. } => ErrorCategory::Client,
            Self::JsonError(_) | Self::ParseError(_) => ErrorCategory::Parsing,
            Self::InvalidParameter(_) | Self::ArgumentParse { .. } => ErrorCategory::Validation,
            Self::DuplicateTool { .. }
            | Self::UnknownTool { .. }
            | Self::ToolExecutionError { .. } => ErrorCategory::Tool,
            Self::ConfigurationError(_) => ErrorCategory::Configuration,
            Self::InternalError(_) | Self::Stage { .. } => ErrorCategory::Unknown,
        }
    }

    /// Whether a remote call failing with this error may succeed when retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Network | ErrorCategory::RateLimit | ErrorCategory::Server
        )
    }
}
