//! Configuration settings for Scout.

use crate::error::{Result, ScoutError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub agent: AgentSettings,
    pub openai: OpenAISettings,
    pub search: SearchSettings,
    pub code: CodeSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Agent loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Chat model used for reasoning.
    pub model: String,
    /// Sampling temperature (0.0-1.0).
    pub temperature: f32,
    /// Maximum reasoning steps per query.
    pub max_iterations: usize,
    /// Timeout for each model request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            max_iterations: 5,
            request_timeout_secs: 30,
        }
    }
}

/// OpenAI credential settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAISettings {
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Alternative API base URL (for compatible gateways).
    pub base_url: Option<String>,
}

impl Default for OpenAISettings {
    fn default() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: None,
        }
    }
}

/// Web search tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Maximum number of results returned to the model.
    pub max_results: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// DuckDuckGo region code (e.g. "us-en").
    pub region: Option<String>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_results: 5,
            timeout_secs: 30,
            region: None,
        }
    }
}

/// Code execution tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeSettings {
    /// Python interpreter binary.
    pub interpreter: String,
    /// Hard wall-clock limit per execution, in seconds.
    pub timeout_secs: u64,
    /// Captured output beyond this many characters is truncated.
    pub max_output_chars: usize,
}

impl Default for CodeSettings {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            timeout_secs: 10,
            max_output_chars: 10_000,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Replacement for the default system instruction.
    pub system: Option<String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Values are not validated here, so `doctor` and `config` can still run
    /// against a file with bad values. Call [`Settings::validate`] before use.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => Self::expand_path(&p.to_string_lossy()),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ScoutError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the agent cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.agent.model.trim().is_empty() {
            return Err(ScoutError::Config("agent.model must not be empty".to_string()));
        }
        if !(0.0..=1.0).contains(&self.agent.temperature) {
            return Err(ScoutError::Config(format!(
                "agent.temperature must be between 0 and 1, got {}",
                self.agent.temperature
            )));
        }
        if self.agent.max_iterations == 0 {
            return Err(ScoutError::Config(
                "agent.max_iterations must be at least 1".to_string(),
            ));
        }
        if self.agent.request_timeout_secs == 0 {
            return Err(ScoutError::Config(
                "agent.request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.search.timeout_secs == 0 {
            return Err(ScoutError::Config(
                "search.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.code.timeout_secs == 0 {
            return Err(ScoutError::Config(
                "code.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String> {
        let var = &self.openai.api_key_env;
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            Ok(_) => Err(ScoutError::Config(format!(
                "{} is empty. Set it with: export {}='sk-...'",
                var, var
            ))),
            Err(_) => Err(ScoutError::Config(format!(
                "{} not set. Set it with: export {}='sk-...'",
                var, var
            ))),
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scout")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }
}
