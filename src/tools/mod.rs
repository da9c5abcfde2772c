//! Built-in tool handlers.

pub mod weather;

use crate::error::LlmError;
use crate::registry::ToolRegistry;

/// Register every built-in tool.
pub fn register_builtin(registry: &mut ToolRegistry) -> Result<(), LlmError> {
    weather::register(registry)
}
