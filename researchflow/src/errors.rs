//! Error types for research sessions.
//!
//! Network and parse failures are surfaced to the caller of the tool boundary
//! as structured values so a policy can treat a source as unavailable without
//! inspecting raw error text.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for researchflow operations.
#[derive(Debug, Clone, Error)]
pub enum ResearchError {
    /// An upstream host was unreachable, timed out or answered with a failure status.
    #[error("{0}")]
    Network(#[from] NetworkError),

    /// A response could not be processed as markup at all.
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// A tool-dispatch error.
    #[error("{0}")]
    Tool(#[from] ToolError),

    /// Invalid configuration (bad selector, unreadable config file).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ResearchError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this is a network failure.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Whether this is a parse failure.
    #[must_use]
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        match self {
            Self::Network(err) => err.to_dict(),
            Self::Parse(err) => err.to_dict(),
            Self::Tool(err) => err.to_dict(),
            Self::Config(message) => {
                let mut map = HashMap::new();
                map.insert("type".to_string(), serde_json::json!("ConfigError"));
                map.insert("message".to_string(), serde_json::json!(message));
                map
            }
            Self::Serialization(message) => {
                let mut map = HashMap::new();
                map.insert("type".to_string(), serde_json::json!("SerializationError"));
                map.insert("message".to_string(), serde_json::json!(message));
                map
            }
        }
    }
}

impl From<serde_json::Error> for ResearchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// What went wrong on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum NetworkErrorKind {
    /// Connection could not be established.
    Unreachable,
    /// The server answered with a non-success status.
    Status(u16),
    /// The request exceeded its timeout.
    Timeout,
    /// Any other transport-level failure (bad URL, body read failure).
    Request,
}

impl NetworkErrorKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Unreachable => "unreachable",
            Self::Status(_) => "status",
            Self::Timeout => "timeout",
            Self::Request => "request",
        }
    }
}

/// Error raised when an outbound request fails.
#[derive(Debug, Clone, Error)]
#[error("Network error fetching {url} ({}): {message}", .kind.as_str())]
pub struct NetworkError {
    /// The URL that was requested.
    pub url: String,
    /// The failure category.
    pub kind: NetworkErrorKind,
    /// Human-readable detail.
    pub message: String,
}

impl NetworkError {
    /// Creates a new network error.
    #[must_use]
    pub fn new(url: impl Into<String>, kind: NetworkErrorKind, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind,
            message: message.into(),
        }
    }

    /// Creates an error for a non-success HTTP status.
    #[must_use]
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::new(url, NetworkErrorKind::Status(status), format!("HTTP status {status}"))
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(url, NetworkErrorKind::Timeout, message)
    }

    /// Creates an unreachable-host error.
    #[must_use]
    pub fn unreachable(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(url, NetworkErrorKind::Unreachable, message)
    }

    /// Returns the HTTP status if the failure was a status error.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self.kind {
            NetworkErrorKind::Status(code) => Some(code),
            _ => None,
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!("NetworkError"));
        map.insert("url".to_string(), serde_json::json!(self.url));
        map.insert("kind".to_string(), serde_json::json!(self.kind.as_str()));
        if let Some(code) = self.status_code() {
            map.insert("status".to_string(), serde_json::json!(code));
        }
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Error raised when a response cannot be processed as markup.
#[derive(Debug, Clone, Error)]
#[error("Parse error for {url}: {message}")]
pub struct ParseError {
    /// The URL whose response failed to parse.
    pub url: String,
    /// Human-readable detail.
    pub message: String,
}

impl ParseError {
    /// Creates a new parse error.
    #[must_use]
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!("ParseError"));
        map.insert("url".to_string(), serde_json::json!(self.url));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Errors related to tool dispatch.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    /// Tool was not found in the registry.
    #[error("Tool not found: {name}")]
    NotFound {
        /// The tool name.
        name: String,
    },

    /// Tool arguments did not match the tool's schema.
    #[error("Invalid arguments for tool {name}: {reason}")]
    InvalidArguments {
        /// The tool name.
        name: String,
        /// What was wrong with the arguments.
        reason: String,
    },

    /// Tool execution failed.
    #[error("Tool execution failed: {name} - {reason}")]
    ExecutionFailed {
        /// The tool name.
        name: String,
        /// The reason for failure.
        reason: String,
    },
}

impl ToolError {
    /// Creates a tool not found error.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Creates an invalid arguments error.
    #[must_use]
    pub fn invalid_arguments(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates an execution failed error.
    #[must_use]
    pub fn execution_failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();

        match self {
            Self::NotFound { name } => {
                map.insert("type".to_string(), serde_json::json!("ToolNotFound"));
                map.insert("name".to_string(), serde_json::json!(name));
            }
            Self::InvalidArguments { name, reason } => {
                map.insert("type".to_string(), serde_json::json!("ToolInvalidArguments"));
                map.insert("name".to_string(), serde_json::json!(name));
                map.insert("reason".to_string(), serde_json::json!(reason));
            }
            Self::ExecutionFailed { name, reason } => {
                map.insert("type".to_string(), serde_json::json!("ToolExecutionError"));
                map.insert("name".to_string(), serde_json::json!(name));
                map.insert("reason".to_string(), serde_json::json!(reason));
            }
        }

        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}
