//! Configuration module for Scout.
//!
//! Handles loading application settings and the agent prompt template.

mod prompts;
mod settings;

pub use prompts::{PromptTemplate, DEFAULT_SYSTEM_PROMPT};
pub use settings::{
    AgentSettings, CodeSettings, GeneralSettings, OpenAISettings, PromptSettings,
    SearchSettings, Settings,
};
