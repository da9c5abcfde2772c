//! Argument validation against a tool's parameter JSON Schema.

use serde_json::Value;

use crate::error::LlmError;

/// Reported errors per failed validation.
const MAX_REPORTED_ERRORS: usize = 3;

/// Parameter schema compiled once at registration.
pub(crate) struct ArgumentValidator {
    tool_name: String,
    compiled: jsonschema::Validator,
}

impl ArgumentValidator {
    /// Compile `schema`. Non-object schemas are not validated.
    pub(crate) fn compile(tool_name: &str, schema: &Value) -> Result<Option<Self>, LlmError> {
        if !schema.is_object() {
            return Ok(None);
        }
        let compiled = jsonschema::validator_for(schema).map_err(|e| {
            LlmError::InvalidParameter(format!(
                "invalid parameter schema for tool '{tool_name}': {e}"
            ))
        })?;
        Ok(Some(Self {
            tool_name: tool_name.to_string(),
            compiled,
        }))
    }

    pub(crate) fn validate(&self, instance: &Value) -> Result<(), LlmError> {
        if self.compiled.is_valid(instance) {
            return Ok(());
        }
        let msgs: Vec<String> = self
            .compiled
            .iter_errors(instance)
            .take(MAX_REPORTED_ERRORS)
            .map(|err| err.to_string())
            .collect();
        Err(LlmError::ArgumentParse {
            tool_name: self.tool_name.clone(),
            reason: msgs.join("; "),
        })
    }
}
