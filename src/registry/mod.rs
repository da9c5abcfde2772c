//! Tool Registry
//!
//! Maps tool names to locally implemented handlers and keeps the schemas
//! advertised to the remote model. Registration happens once at startup; an
//! orchestrator only ever borrows the registry immutably, so a single registry
//! can back any number of concurrent runs.
//!
//! # Example
//!
//! ```rust,ignore
//! use toolrelay::registry::ToolRegistry;
//! use toolrelay::types::Tool;
//! use serde_json::json;
//!
//! let mut registry = ToolRegistry::new();
//! registry.register(
//!     Tool::function("echo", "Echo the input", json!({"type": "object"})),
//!     |args: &serde_json::Value| Ok(args.clone()),
//! )?;
//! ```

mod handler;
mod validation;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::LlmError;
use crate::types::{Tool, ToolCall};

pub use handler::ToolHandler;
use validation::ArgumentValidator;

struct RegistryEntry {
    handler: Arc<dyn ToolHandler>,
    validator: Option<ArgumentValidator>,
}

/// Name → (schema, handler) mapping.
#[derive(Default)]
pub struct ToolRegistry {
    entries: HashMap<String, RegistryEntry>,
    /// Schemas in registration order
    schemas: Vec<Tool>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under the name declared by its schema.
    pub fn register<H>(&mut self, schema: Tool, handler: H) -> Result<(), LlmError>
    where
        H: ToolHandler + 'static,
    {
        let name = schema.function.name.clone();
        self.register_named(name, schema, handler)
    }

    /// Register a tool under an explicit name.
    ///
    /// Fails with [`LlmError::DuplicateTool`] when the name is taken, and with
    /// [`LlmError::InvalidParameter`] when `name` disagrees with the schema or
    /// the parameter schema does not compile.
    pub fn register_named<H>(
        &mut self,
        name: impl Into<String>,
        schema: Tool,
        handler: H,
    ) -> Result<(), LlmError>
    where
        H: ToolHandler + 'static,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(LlmError::InvalidParameter(
                "tool name must not be empty".to_string(),
            ));
        }
        if schema.function.name != name {
            return Err(LlmError::InvalidParameter(format!(
                "tool registered as '{}' but its schema is named '{}'",
                name, schema.function.name
            )));
        }
        if self.entries.contains_key(&name) {
            return Err(LlmError::DuplicateTool { name });
        }

        let validator = ArgumentValidator::compile(&name, &schema.function.parameters)?;
        tracing::debug!(tool = %name, validated = validator.is_some(), "registered tool");

        self.entries.insert(
            name,
            RegistryEntry {
                handler: Arc::new(handler),
                validator,
            },
        );
        self.schemas.push(schema);
        Ok(())
    }

    /// Schemas to advertise to the remote model, in registration order.
    pub fn schemas(&self) -> &[Tool] {
        &self.schemas
    }

    /// Look up the handler registered under `name`.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn ToolHandler>, LlmError> {
        self.entries
            .get(name)
            .map(|e| Arc::clone(&e.handler))
            .ok_or_else(|| LlmError::UnknownTool {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.iter().map(Tool::name)
    }

    /// Parse and validate the argument payload of a requested call.
    ///
    /// An empty payload is treated as `{}`. Malformed JSON, a payload that is
    /// not an object, or one that violates the registered parameter schema
    /// fails with [`LlmError::ArgumentParse`]; an unregistered tool fails with
    /// [`LlmError::UnknownTool`].
    pub fn parse_arguments(&self, call: &ToolCall) -> Result<Value, LlmError> {
        let name = call.name();
        let args = parse_payload(name, &call.function.arguments)?;
        self.validate_arguments(name, &args)?;
        Ok(args)
    }

    /// Validate already parsed arguments against the tool's parameter schema.
    pub fn validate_arguments(&self, name: &str, args: &Value) -> Result<(), LlmError> {
        let entry = self.entries.get(name).ok_or_else(|| LlmError::UnknownTool {
            name: name.to_string(),
        })?;
        match &entry.validator {
            Some(validator) => validator.validate(args),
            None => Ok(()),
        }
    }
}

fn parse_payload(tool_name: &str, raw: &str) -> Result<Value, LlmError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    let value: Value = serde_json::from_str(raw).map_err(|e| LlmError::ArgumentParse {
        tool_name: tool_name.to_string(),
        reason: format!("malformed JSON: {e}"),
    })?;
    if !value.is_object() {
        return Err(LlmError::ArgumentParse {
            tool_name: tool_name.to_string(),
            reason: "arguments must be a JSON object".to_string(),
        });
    }
    Ok(value)
}
