//! Error types for Scout.

use crate::tools::ToolInvocation;
use thiserror::Error;

/// Library-level error type for Scout operations.
#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tool '{tool}' failed: {message}")]
    ToolExecution { tool: String, message: String },

    /// Carries the tool calls made before the loop gave up.
    #[error("Agent stopped after {steps} reasoning steps without a final answer")]
    MaxIterationsExceeded {
        steps: usize,
        tool_calls: Vec<ToolInvocation>,
    },

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ScoutError {
    /// Shorthand for a tool failure.
    pub fn tool(tool: &str, message: impl Into<String>) -> Self {
        ScoutError::ToolExecution {
            tool: tool.to_string(),
            message: message.into(),
        }
    }

    /// Whether the failure came from an external service (model or network).
    pub fn is_upstream(&self) -> bool {
        matches!(self, ScoutError::Upstream(_) | ScoutError::Http(_))
    }
}

/// Result type alias for Scout operations.
pub type Result<T> = std::result::Result<T, ScoutError>;
