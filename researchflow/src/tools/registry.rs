//! Explicit name-to-handler tool registry.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::{ToolDefinition, ToolOutput};
use crate::errors::{ResearchError, ToolError};

/// A resolved tool call ready for execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedToolCall {
    /// The call ID.
    pub id: String,
    /// The tool name.
    pub name: String,
    /// The parsed arguments.
    pub arguments: serde_json::Value,
}

/// A tool call that failed parsing or resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnresolvedToolCall {
    /// The call ID if available.
    pub id: Option<String>,
    /// The tool name if available.
    pub name: Option<String>,
    /// The error message.
    pub error: String,
    /// The original raw call.
    pub raw: serde_json::Value,
}

/// Trait for tool implementations.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool definition. The definition's name is the dispatch key.
    fn definition(&self) -> ToolDefinition;

    /// Runs the tool on a JSON arguments object.
    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ResearchError>;
}

/// Registry mapping tool names to handlers.
///
/// Tools are added by explicit `register` calls; nothing is discovered at
/// runtime.
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<BTreeMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool under its definition's name, replacing any previous one.
    pub fn register(&self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        self.tools.write().insert(name, tool);
    }

    /// Gets a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.read().get(name).cloned()
    }

    /// Checks if a tool is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.read().contains_key(name)
    }

    /// Lists registered tool names in sorted order.
    pub fn list_tools(&self) -> Vec<String> {
        self.tools.read().keys().cloned().collect()
    }

    /// Definitions of all registered tools, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.read().values().map(|t| t.definition()).collect()
    }

    /// Runs a tool by name and returns its raw result.
    pub async fn call(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, ResearchError> {
        let tool = self.get(name).ok_or_else(|| ToolError::not_found(name))?;
        tool.execute(arguments).await
    }

    /// Runs a tool by name. Failures come back as a structured `ToolOutput`.
    pub async fn dispatch(&self, name: &str, arguments: serde_json::Value) -> ToolOutput {
        match self.call(name, arguments).await {
            Ok(data) => {
                info!(tool = %name, "tool call succeeded");
                ToolOutput::ok(name, data)
            }
            Err(err) => {
                warn!(tool = %name, error = %err, "tool call failed");
                ToolOutput::fail(name, &err)
            }
        }
    }

    /// Runs a previously resolved call.
    pub async fn execute_call(&self, call: &ResolvedToolCall) -> ToolOutput {
        self.dispatch(&call.name, call.arguments.clone()).await
    }

    /// Parses and resolves tool calls from raw data.
    ///
    /// Accepts the OpenAI shape: `{"id": ..., "function": {"name": ..., "arguments": "<json>"}}`,
    /// with `arguments` either a JSON string or an object.
    pub fn parse_and_resolve(
        &self,
        calls: &[serde_json::Value],
    ) -> Vec<Result<ResolvedToolCall, UnresolvedToolCall>> {
        calls.iter().map(|call| self.resolve_call(call)).collect()
    }

    fn resolve_call(&self, call: &serde_json::Value) -> Result<ResolvedToolCall, UnresolvedToolCall> {
        let id = call.get("id").and_then(|v| v.as_str()).map(String::from);
        let unresolved = |name: Option<String>, error: String| UnresolvedToolCall {
            id: id.clone(),
            name,
            error,
            raw: call.clone(),
        };

        let func_obj = call.get("function").unwrap_or(call);

        let Some(name) = func_obj.get("name").and_then(|v| v.as_str()).map(String::from) else {
            return Err(unresolved(None, "Missing tool name".to_string()));
        };

        let arguments = match func_obj.get("arguments") {
            Some(serde_json::Value::String(s)) if s.trim().is_empty() => serde_json::json!({}),
            Some(serde_json::Value::String(s)) => match serde_json::from_str(s) {
                Ok(args) => args,
                Err(_) => {
                    return Err(unresolved(Some(name), "Invalid JSON in arguments".to_string()));
                }
            },
            Some(serde_json::Value::Object(obj)) => serde_json::Value::Object(obj.clone()),
            _ => serde_json::json!({}),
        };

        if !self.contains(&name) {
            let error = format!("No tool registered with name '{name}'");
            return Err(unresolved(Some(name), error));
        }

        Ok(ResolvedToolCall {
            id: id.clone().unwrap_or_default(),
            name,
            arguments,
        })
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.list_tools())
            .finish()
    }
}
