//! Tool adapters exposed to the agent.
//!
//! Every tool takes free-form text in and returns free-form text out. The set
//! is fixed at construction: one web search tool and one code execution tool.

mod python;
mod search;

pub use python::PythonRepl;
pub use search::WebSearch;

use crate::config::Settings;
use crate::error::{Result, ScoutError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// A capability the agent can call by name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model uses to call the tool.
    fn name(&self) -> &str;

    /// What the tool is for, shown to the model.
    fn description(&self) -> &str;

    /// Name of the single string argument the model fills in.
    fn argument(&self) -> &str;

    /// Description of that argument.
    fn argument_description(&self) -> &str;

    /// JSON schema of the tool parameters.
    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                (self.argument()): {
                    "type": "string",
                    "description": self.argument_description()
                }
            },
            "required": [self.argument()]
        })
    }

    /// Run the tool on the given input.
    async fn invoke(&self, input: &str) -> Result<String>;
}

/// Name, description and schema of a tool, as presented to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Record of one tool call made while answering a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Name of the tool called.
    pub name: String,
    /// Text input passed to the tool.
    pub input: String,
    /// Tool output, or the error text fed back to the model.
    pub output: String,
    /// Whether the tool completed without error.
    pub succeeded: bool,
    /// When the call started.
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl std::fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.input)
    }
}

/// The fixed pair of tools available to the agent.
#[derive(Clone)]
pub struct ToolSet {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolSet {
    /// Create a tool set from a search tool and a code execution tool.
    pub fn new(search: Arc<dyn Tool>, code: Arc<dyn Tool>) -> Self {
        Self {
            tools: vec![search, code],
        }
    }

    /// Build the default DuckDuckGo + Python tools from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let search = WebSearch::from_settings(&settings.search)?;
        let code = PythonRepl::from_settings(&settings.code);
        Ok(Self::new(Arc::new(search), Arc::new(code)))
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Tool names in declaration order.
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    /// Specs for all tools, for the model.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools
            .iter()
            .map(|t| ToolSpec {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect()
    }

    /// Resolve a model tool request into a tool and its text input.
    ///
    /// Fails with `ScoutError::Agent` for unknown tools or unusable arguments.
    pub fn resolve(&self, name: &str, arguments: &str) -> Result<(Arc<dyn Tool>, String)> {
        let tool = self.get(name).cloned().ok_or_else(|| {
            ScoutError::Agent(format!(
                "Unknown tool '{}'. Available tools: {}",
                name,
                self.names().join(", ")
            ))
        })?;
        let input = parse_input(tool.argument(), arguments)?;
        Ok((tool, input))
    }

    /// Run a resolved tool, capturing failures as text for the model.
    pub async fn run(&self, tool: &Arc<dyn Tool>, input: &str) -> ToolInvocation {
        let started_at = Utc::now();
        let start = Instant::now();

        info!("Agent calling tool: {} with input: {}", tool.name(), input);

        let (output, succeeded) = match tool.invoke(input).await {
            Ok(output) => (output, true),
            Err(e) => {
                warn!("Tool {} failed: {}", tool.name(), e);
                (format!("Tool error: {}", e), false)
            }
        };

        ToolInvocation {
            name: tool.name().to_string(),
            input: input.to_string(),
            output,
            succeeded,
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }
}

/// Extract the text input from the model's JSON arguments.
fn parse_input(argument: &str, arguments: &str) -> Result<String> {
    let args: Value = serde_json::from_str(arguments)
        .map_err(|e| ScoutError::Agent(format!("Invalid tool arguments: {}", e)))?;

    let input = match &args {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get(argument).and_then(Value::as_str),
        _ => None,
    };

    match input {
        Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
        Some(_) => Err(ScoutError::Agent(format!("Empty '{}' argument", argument))),
        None => Err(ScoutError::Agent(format!("Missing '{}' argument", argument))),
    }
}
