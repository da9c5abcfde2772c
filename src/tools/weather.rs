//! `get_current_weather`: canned weather lookup.
//!
//! Returns fixed readings for a few cities so the two-stage exchange can be
//! exercised end to end without a weather backend.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::LlmError;
use crate::registry::ToolRegistry;
use crate::types::Tool;

pub const TOOL_NAME: &str = "get_current_weather";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    Celsius,
    #[default]
    Fahrenheit,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherParams {
    /// City and state, e.g. "San Francisco, CA"
    pub location: String,
    /// Accepted for schema compatibility; the canned readings carry their own unit.
    #[serde(default)]
    pub unit: Option<TemperatureUnit>,
}

/// Schema advertised to the model.
pub fn schema() -> Tool {
    Tool::function(
        TOOL_NAME,
        "Get the current weather in a given location",
        json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "The city and state, e.g. San Francisco, CA"
                },
                "unit": {"type": "string", "enum": ["celsius", "fahrenheit"]}
            },
            "required": ["location"]
        }),
    )
}

/// Look up the weather for `location`. Matching is a case-insensitive
/// substring test; unknown locations report `"unknown"`.
pub fn get_current_weather(location: &str, _unit: TemperatureUnit) -> Value {
    let needle = location.to_lowercase();
    if needle.contains("tokyo") {
        json!({"location": "Tokyo", "temperature": "10", "unit": "celsius"})
    } else if needle.contains("san francisco") {
        json!({"location": "San Francisco", "temperature": "72", "unit": "fahrenheit"})
    } else if needle.contains("paris") {
        json!({"location": "Paris", "temperature": "22", "unit": "celsius"})
    } else {
        json!({"location": location, "temperature": "unknown"})
    }
}

/// Registry handler.
pub fn handle(args: &Value) -> Result<Value, LlmError> {
    let params = WeatherParams::deserialize(args).map_err(|e| LlmError::ArgumentParse {
        tool_name: TOOL_NAME.to_string(),
        reason: e.to_string(),
    })?;
    tracing::debug!(location = %params.location, unit = ?params.unit, "weather lookup");
    Ok(get_current_weather(
        &params.location,
        params.unit.unwrap_or_default(),
    ))
}

pub fn register(registry: &mut ToolRegistry) -> Result<(), LlmError> {
    registry.register(schema(), handle)
}
