//! Tool definitions and I/O types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::ResearchError;

/// Definition of a tool that can be executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name, unique within a registry.
    pub name: String,
    /// Description of what the tool does.
    pub description: String,
    /// JSON Schema for the arguments object.
    pub input_schema: serde_json::Value,
}

impl ToolDefinition {
    /// Creates a new tool definition.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            input_schema: serde_json::json!({"type": "object", "properties": {}}),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Sets the input schema.
    #[must_use]
    pub fn with_input_schema(mut self, schema: serde_json::Value) -> Self {
        self.input_schema = schema;
        self
    }

    /// Names of required arguments, as declared by the schema.
    #[must_use]
    pub fn required_arguments(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default()
    }

    /// Renders the definition in the OpenAI function-calling format.
    #[must_use]
    pub fn to_openai_function(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.input_schema,
            }
        })
    }
}

/// Output from a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// The tool that produced this output.
    pub tool: String,
    /// Whether the execution succeeded.
    pub success: bool,
    /// The output data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Structured error (with a `type` field) if failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

impl ToolOutput {
    /// Creates a successful output.
    #[must_use]
    pub fn ok(tool: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            tool: tool.into(),
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Creates a failure output from an error.
    #[must_use]
    pub fn fail(tool: impl Into<String>, error: &ResearchError) -> Self {
        let details: serde_json::Map<String, serde_json::Value> =
            error.to_dict().into_iter().collect();
        Self {
            tool: tool.into(),
            success: false,
            data: None,
            error: Some(serde_json::Value::Object(details)),
        }
    }

    /// The error's `type` field, e.g. `"NetworkError"`.
    #[must_use]
    pub fn error_type(&self) -> Option<&str> {
        self.error
            .as_ref()
            .and_then(|e| e.get("type"))
            .and_then(|t| t.as_str())
    }

    /// Deserializes the data payload.
    pub fn data_as<T: serde::de::DeserializeOwned>(&self) -> Option<T> {
        self.data
            .as_ref()
            .and_then(|d| serde_json::from_value(d.clone()).ok())
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("tool".to_string(), serde_json::json!(self.tool));
        map.insert("success".to_string(), serde_json::json!(self.success));

        if let Some(ref data) = self.data {
            map.insert("data".to_string(), data.clone());
        }
        if let Some(ref error) = self.error {
            map.insert("error".to_string(), error.clone());
        }

        map
    }
}
