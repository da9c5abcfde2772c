//! Tool batch dispatch.
//!
//! Resolves each requested call against the registry, runs its handler and
//! turns the outcome into a [`ToolResult`]. Failures are either reported to the
//! model as error payloads or abort the batch, depending on the policy.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::Value;

use super::types::{DispatchMode, OrchestratorOptions, ToolFailurePolicy};
use crate::error::LlmError;
use crate::registry::{ToolHandler, ToolRegistry};
use crate::types::{ToolCall, ToolResult};

/// Error kinds used in synthesized `{"error": kind, "message": ...}` payloads.
pub(crate) fn error_kind(err: &LlmError) -> &'static str {
    match err.root() {
        LlmError::UnknownTool { .. } => "unknown_tool",
        LlmError::ArgumentParse { .. } => "invalid_arguments",
        LlmError::TimeoutError(_) => "timeout",
        _ => "execution_failed",
    }
}

pub(crate) struct ToolDispatcher<'a> {
    registry: &'a ToolRegistry,
    options: &'a OrchestratorOptions,
}

impl<'a> ToolDispatcher<'a> {
    pub(crate) fn new(registry: &'a ToolRegistry, options: &'a OrchestratorOptions) -> Self {
        Self { registry, options }
    }

    /// Execute a batch and return one result per call, in request order.
    pub(crate) async fn dispatch(&self, calls: &[ToolCall]) -> Result<Vec<ToolResult>, LlmError> {
        let outcomes = match self.options.dispatch {
            DispatchMode::Sequential => {
                let mut outcomes = Vec::with_capacity(calls.len());
                for call in calls {
                    let outcome = self.execute_call(call, false).await;
                    let failed = outcome.is_err();
                    outcomes.push(outcome);
                    if failed && self.options.failure_policy == ToolFailurePolicy::Abort {
                        break;
                    }
                }
                outcomes
            }
            // join_all yields outputs in input order regardless of completion order
            DispatchMode::Concurrent => {
                join_all(calls.iter().map(|call| self.execute_call(call, true))).await
            }
        };

        let mut results = Vec::with_capacity(calls.len());
        for (call, outcome) in calls.iter().zip(outcomes) {
            let result = match outcome {
                Ok(output) => ToolResult::success(&call.id, call.name(), output),
                Err(err) => match self.options.failure_policy {
                    ToolFailurePolicy::Abort => {
                        tracing::error!(
                            tool = call.name(),
                            call_id = %call.id,
                            error = %err,
                            "tool call failed, aborting run"
                        );
                        return Err(err.at_tool_call(call.name(), &call.id));
                    }
                    ToolFailurePolicy::ReportToModel => {
                        tracing::warn!(
                            tool = call.name(),
                            call_id = %call.id,
                            error = %err,
                            "tool call failed, reporting error to model"
                        );
                        ToolResult::error(&call.id, call.name(), error_kind(&err), err.to_string())
                    }
                },
            };
            results.push(result);
        }
        Ok(results)
    }

    async fn execute_call(&self, call: &ToolCall, offload: bool) -> Result<Value, LlmError> {
        let args = self.registry.parse_arguments(call)?;
        let handler = self.registry.resolve(call.name())?;
        tracing::debug!(tool = call.name(), call_id = %call.id, "invoking tool");
        run_handler(handler, args, self.options.tool_timeout, offload).await
    }
}

/// Run a handler. Handlers are synchronous, so they are moved to the blocking
/// pool whenever a deadline applies or the batch runs concurrently.
async fn run_handler(
    handler: Arc<dyn ToolHandler>,
    args: Value,
    timeout: Option<Duration>,
    offload: bool,
) -> Result<Value, LlmError> {
    if timeout.is_none() && !offload {
        return handler.invoke(&args);
    }

    let task = tokio::task::spawn_blocking(move || handler.invoke(&args));
    let joined = match timeout {
        Some(limit) => tokio::time::timeout(limit, task)
            .await
            .map_err(|_| LlmError::TimeoutError(format!("tool did not finish within {limit:?}")))?,
        None => task.await,
    };
    joined.map_err(|e| LlmError::InternalError(format!("tool task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExchangeStage;
    use crate::types::{FunctionCall, Tool};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn schema(name: &str) -> Tool {
        Tool::function(name, "test tool", json!({"type": "object"}))
    }

    fn call(id: &str, name: &str, args: &str) -> ToolCall {
        ToolCall::function(
            id,
            FunctionCall {
                name: name.into(),
                arguments: args.into(),
            },
        )
    }

    fn echo(args: &Value) -> Result<Value, LlmError> {
        Ok(args.clone())
    }

    fn fail(_args: &Value) -> Result<Value, LlmError> {
        Err(LlmError::ToolExecutionError {
            tool_name: "fail".into(),
            message: "backend unavailable".into(),
        })
    }

    fn slow(args: &Value) -> Result<Value, LlmError> {
        let ms = args["ms"].as_u64().unwrap_or(0);
        std::thread::sleep(Duration::from_millis(ms));
        Ok(json!({"slept": ms}))
    }

    fn registry() -> ToolRegistry {
        let mut r = ToolRegistry::new();
        r.register(schema("echo"), echo).unwrap();
        r.register(schema("fail"), fail).unwrap();
        r.register(schema("slow"), slow).unwrap();
        r
    }

    #[test]
    fn error_kinds() {
        assert_eq!(error_kind(&LlmError::UnknownTool { name: "x".into() }), "unknown_tool");
        assert_eq!(
            error_kind(&LlmError::ArgumentParse {
                tool_name: "x".into(),
                reason: "bad".into()
            }),
            "invalid_arguments"
        );
        assert_eq!(error_kind(&LlmError::TimeoutError("t".into())), "timeout");
        assert_eq!(error_kind(&LlmError::InternalError("x".into())), "execution_failed");
    }

    #[tokio::test]
    async fn reports_failures_in_place() {
        let registry = registry();
        let options = OrchestratorOptions::default();
        let dispatcher = ToolDispatcher::new(&registry, &options);
        let calls = vec![
            call("c1", "echo", r#"{"a": 1}"#),
            call("c2", "missing", "{}"),
            call("c3", "fail", "{}"),
            call("c4", "echo", "not json"),
        ];

        let results = dispatcher.dispatch(&calls).await.unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.call_id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3", "c4"]);
        assert!(!results[0].is_error);
        assert_eq!(results[0].output, json!({"a": 1}));
        assert_eq!(results[1].output["error"], "unknown_tool");
        assert_eq!(results[2].output["error"], "execution_failed");
        assert_eq!(results[3].output["error"], "invalid_arguments");
    }

    #[tokio::test]
    async fn abort_stops_at_first_failure() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = counter.clone();
        let mut registry = registry();
        registry
            .register(schema("count"), move |_: &Value| -> Result<Value, LlmError> {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(json!(null))
            })
            .unwrap();

        let options = OrchestratorOptions {
            failure_policy: ToolFailurePolicy::Abort,
            ..Default::default()
        };
        let dispatcher = ToolDispatcher::new(&registry, &options);
        let calls = vec![
            call("c1", "count", "{}"),
            call("c2", "missing", "{}"),
            call("c3", "count", "{}"),
        ];

        let err = dispatcher.dispatch(&calls).await.unwrap_err();
        match err {
            LlmError::Stage {
                tool_name, call_id, ..
            } => {
                assert_eq!(tool_name.as_deref(), Some("missing"));
                assert_eq!(call_id.as_deref(), Some("c2"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_abort_returns_first_failure_in_request_order() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = counter.clone();
        let mut registry = registry();
        registry
            .register(schema("count"), move |_: &Value| -> Result<Value, LlmError> {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(json!(null))
            })
            .unwrap();

        let options = OrchestratorOptions {
            failure_policy: ToolFailurePolicy::Abort,
            dispatch: DispatchMode::Concurrent,
            ..Default::default()
        };
        let dispatcher = ToolDispatcher::new(&registry, &options);
        // c4 fails at resolution, before c2's handler even runs.
        let calls = vec![
            call("c1", "count", "{}"),
            call("c2", "fail", "{}"),
            call("c3", "count", "{}"),
            call("c4", "missing", "{}"),
        ];

        let err = dispatcher.dispatch(&calls).await.unwrap_err();
        assert_eq!(err.stage(), Some(ExchangeStage::ToolResolution));
        match &err {
            LlmError::Stage {
                tool_name, call_id, ..
            } => {
                assert_eq!(tool_name.as_deref(), Some("fail"));
                assert_eq!(call_id.as_deref(), Some("c2"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(err.root(), LlmError::ToolExecutionError { .. }));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_results_keep_request_order() {
        let registry = registry();
        let options = OrchestratorOptions {
            dispatch: DispatchMode::Concurrent,
            ..Default::default()
        };
        let dispatcher = ToolDispatcher::new(&registry, &options);
        let calls = vec![
            call("c1", "slow", r#"{"ms": 60}"#),
            call("c2", "slow", r#"{"ms": 1}"#),
            call("c3", "slow", r#"{"ms": 30}"#),
        ];

        let results = dispatcher.dispatch(&calls).await.unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.call_id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
        assert_eq!(results[0].output, json!({"slept": 60}));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn tool_timeout_is_reported() {
        let registry = registry();
        let options = OrchestratorOptions {
            tool_timeout: Some(Duration::from_millis(20)),
            ..Default::default()
        };
        let dispatcher = ToolDispatcher::new(&registry, &options);
        let results = dispatcher
            .dispatch(&[call("c1", "slow", r#"{"ms": 500}"#)])
            .await
            .unwrap();
        assert!(results[0].is_error);
        assert_eq!(results[0].output["error"], "timeout");
    }
}
