//! Tool handler contract.

use serde_json::Value;

use crate::error::LlmError;

/// A locally implemented tool.
///
/// Handlers are synchronous: they receive the parsed arguments (always an
/// object holding at least the declared required fields) and return a
/// serializable result. Optional fields may be absent; the handler supplies
/// its own defaults.
pub trait ToolHandler: Send + Sync {
    fn invoke(&self, args: &Value) -> Result<Value, LlmError>;
}

impl<F> ToolHandler for F
where
    F: Fn(&Value) -> Result<Value, LlmError> + Send + Sync,
{
    fn invoke(&self, args: &Value) -> Result<Value, LlmError> {
        self(args)
    }
}
