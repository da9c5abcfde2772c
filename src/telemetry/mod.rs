//! Tracing subscriber setup
//!
//! The library only emits `tracing` events; installing a subscriber is left to
//! the application. This module offers the one the `toolrelay` binary uses:
//! console output on stderr (text or JSON) plus an optional log file written
//! through a non-blocking appender.
//!
//! ## Example
//!
//! ```rust,ignore
//! use toolrelay::telemetry::{init_subscriber, OutputFormat, SubscriberConfig};
//!
//! let config = SubscriberConfig::builder()
//!     .log_level(tracing::Level::DEBUG)
//!     .output_format(OutputFormat::Json)
//!     .build();
//! let _guard = init_subscriber(config)?;
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::LlmError;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// One JSON object per line, with span context
    Json,
    /// One flattened JSON object per line, without span context
    JsonCompact,
}

impl FromStr for OutputFormat {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "json-compact" | "json_compact" => Ok(Self::JsonCompact),
            other => Err(LlmError::ConfigurationError(format!(
                "Invalid log format: {other}. Valid options: text, json, json-compact"
            ))),
        }
    }
}

/// Configuration for tracing subscriber
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Log level for this crate (ignored when `RUST_LOG` is set)
    pub log_level: tracing::Level,
    pub output_format: OutputFormat,
    /// Enable console (stderr) output
    pub enable_console: bool,
    /// Log file path (optional)
    pub log_file: Option<PathBuf>,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            log_level: tracing::Level::INFO,
            output_format: OutputFormat::Text,
            enable_console: true,
            log_file: None,
        }
    }
}

impl SubscriberConfig {
    pub fn builder() -> SubscriberConfigBuilder {
        SubscriberConfigBuilder::default()
    }

    /// Filter directive used when `RUST_LOG` is not set.
    fn default_directive(&self) -> String {
        format!(
            "{}={}",
            env!("CARGO_CRATE_NAME"),
            self.log_level.as_str().to_lowercase()
        )
    }
}

/// Builder for SubscriberConfig
#[derive(Debug, Default)]
pub struct SubscriberConfigBuilder {
    log_level: Option<tracing::Level>,
    output_format: Option<OutputFormat>,
    enable_console: Option<bool>,
    log_file: Option<PathBuf>,
}

impl SubscriberConfigBuilder {
    pub fn log_level(mut self, level: tracing::Level) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Set the log level from a string (trace, debug, info, warn, error).
    pub fn log_level_str(mut self, level: &str) -> Result<Self, LlmError> {
        let level = tracing::Level::from_str(level.trim()).map_err(|_| {
            LlmError::ConfigurationError(format!(
                "Invalid log level: {level}. Valid options: trace, debug, info, warn, error"
            ))
        })?;
        self.log_level = Some(level);
        Ok(self)
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn enable_console(mut self, enable: bool) -> Self {
        self.enable_console = Some(enable);
        self
    }

    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn build(self) -> SubscriberConfig {
        SubscriberConfig {
            log_level: self.log_level.unwrap_or(tracing::Level::INFO),
            output_format: self.output_format.unwrap_or_default(),
            enable_console: self.enable_console.unwrap_or(true),
            log_file: self.log_file,
        }
    }
}

/// Install the global tracing subscriber.
///
/// Returns the appender guard when file logging is enabled; it must be kept
/// alive for the lifetime of the program or buffered lines are lost. If a
/// global subscriber is already installed this is a no-op returning `Ok(None)`.
pub fn init_subscriber(config: SubscriberConfig) -> Result<Option<WorkerGuard>, LlmError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));

    let mut layers: Vec<BoxedLayer> = Vec::new();
    if config.enable_console {
        layers.push(format_layer(config.output_format, std::io::stderr, true));
    }

    let mut guard = None;
    if let Some(path) = &config.log_file {
        let (dir, file_name) = split_log_path(path)?;
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (writer, worker_guard) = tracing_appender::non_blocking(appender);
        layers.push(format_layer(config.output_format, writer, false));
        guard = Some(worker_guard);
    }

    match tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
    {
        Ok(()) => Ok(guard),
        Err(e) => {
            let error_msg = e.to_string();
            if error_msg.contains("already been set") {
                Ok(None)
            } else {
                Err(LlmError::ConfigurationError(format!(
                    "Failed to initialize tracing: {e}"
                )))
            }
        }
    }
}

/// Initialize tracing subscriber from environment variables
///
/// Supported environment variables:
/// - `TOOLRELAY_LOG_LEVEL`: Log level (trace, debug, info, warn, error)
/// - `TOOLRELAY_LOG_FORMAT`: Output format (text, json, json-compact)
/// - `TOOLRELAY_LOG_FILE`: Log file path
pub fn init_from_env() -> Result<Option<WorkerGuard>, LlmError> {
    init_subscriber(config_from_env(SubscriberConfig::builder())?)
}

/// Apply `TOOLRELAY_LOG_*` variables on top of `builder`.
pub fn config_from_env(mut builder: SubscriberConfigBuilder) -> Result<SubscriberConfig, LlmError> {
    if let Ok(level) = std::env::var("TOOLRELAY_LOG_LEVEL") {
        builder = builder.log_level_str(&level)?;
    }
    if let Ok(format) = std::env::var("TOOLRELAY_LOG_FORMAT") {
        builder = builder.output_format(format.parse()?);
    }
    if let Ok(file_path) = std::env::var("TOOLRELAY_LOG_FILE") {
        if !file_path.trim().is_empty() {
            builder = builder.log_file(file_path);
        }
    }
    Ok(builder.build())
}

fn format_layer<W>(format: OutputFormat, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_ansi(ansi);
    match format {
        OutputFormat::Text => layer.boxed(),
        OutputFormat::Json => layer
            .json()
            .with_thread_ids(true)
            .with_thread_names(true)
            .boxed(),
        OutputFormat::JsonCompact => layer
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_span_list(false)
            .boxed(),
    }
}

fn split_log_path(path: &Path) -> Result<(PathBuf, PathBuf), LlmError> {
    let file_name = path.file_name().ok_or_else(|| {
        LlmError::ConfigurationError(format!("log file path has no file name: {}", path.display()))
    })?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, PathBuf::from(file_name)))
}
