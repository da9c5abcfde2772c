use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use serde_json::json;
use toolrelay::prelude::*;
use toolrelay::telemetry::{self, OutputFormat, SubscriberConfig};

const DEFAULT_PROMPT: &str = "What's the weather like in San Francisco, Tokyo, and Paris?";

/// Ask a chat model a question, run the tools it requests, and print its final answer.
#[derive(Parser, Debug)]
#[command(name = "toolrelay", version, about)]
struct Cli {
    /// User prompt.
    #[arg(short, long, default_value = DEFAULT_PROMPT)]
    prompt: String,

    /// Model identifier (overrides OPENAI_MODEL).
    #[arg(short, long)]
    model: Option<String>,

    /// API base URL (overrides OPENAI_BASE_URL).
    #[arg(long)]
    base_url: Option<String>,

    /// Execute requested tools concurrently.
    #[arg(long)]
    concurrent: bool,

    /// Stop at the first failing tool call instead of reporting it to the model.
    #[arg(long)]
    abort_on_tool_error: bool,

    /// Deadline for each remote call, in seconds.
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Deadline for each tool invocation, in seconds.
    #[arg(long)]
    tool_timeout_secs: Option<u64>,

    /// Retries per remote call after a transient failure (0 disables retries).
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Log output format: text, json or json-compact.
    #[arg(long, env = "TOOLRELAY_LOG_FORMAT", default_value = "text")]
    log_format: OutputFormat,

    /// Log level for this crate.
    #[arg(long, env = "TOOLRELAY_LOG_LEVEL", default_value = "warn")]
    log_level: tracing::Level,

    /// Print the final response and run summary as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = SubscriberConfig::builder()
        .log_level(cli.log_level)
        .output_format(cli.log_format);
    let _guard = match telemetry::config_from_env(subscriber).and_then(telemetry::init_subscriber) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, stage = ?e.stage(), "run failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// `retries` counts the calls made after the first one.
fn retry_policy(retries: u32) -> Option<RetryPolicy> {
    (retries > 0).then(|| RetryPolicy::new().with_attempts(retries.saturating_add(1)))
}

async fn run(cli: Cli) -> Result<(), LlmError> {
    let mut config = OpenAiConfig::from_env()?.with_timeout(Duration::from_secs(cli.timeout_secs));
    if let Some(model) = cli.model {
        config = config.with_model(model);
    }
    if let Some(base_url) = cli.base_url {
        config = config.with_base_url(base_url);
    }
    let client = OpenAiClient::new_with_config(config)?;

    let mut registry = ToolRegistry::new();
    toolrelay::tools::register_builtin(&mut registry)?;

    let policy = if cli.abort_on_tool_error {
        ToolFailurePolicy::Abort
    } else {
        ToolFailurePolicy::ReportToModel
    };
    let mut orchestrator = Orchestrator::new(&client, &registry)
        .failure_policy(policy)
        .concurrent(cli.concurrent)
        .remote_timeout(Duration::from_secs(cli.timeout_secs));
    if let Some(retry) = retry_policy(cli.retries) {
        orchestrator = orchestrator.retry(retry);
    }
    if let Some(secs) = cli.tool_timeout_secs {
        orchestrator = orchestrator.tool_timeout(Duration::from_secs(secs));
    }

    tracing::info!(model = client.model(), tools = registry.len(), "starting run");
    let outcome = orchestrator.run(cli.prompt).await?;

    if cli.json {
        let tool_results: Vec<_> = outcome
            .tool_results
            .iter()
            .map(|r| {
                json!({
                    "call_id": r.call_id,
                    "tool_name": r.tool_name,
                    "output": r.output,
                    "is_error": r.is_error,
                })
            })
            .collect();
        let summary = json!({
            "response": outcome.response,
            "remote_calls": outcome.remote_calls,
            "tool_results": tool_results,
            "usage": outcome.usage,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", outcome.text().unwrap_or_default());
    }
    Ok(())
}
