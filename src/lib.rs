//! Scout - a conversational research assistant
//!
//! Scout forwards questions to an LLM agent that can search the web and run
//! Python code before answering.
//!
//! # Architecture
//!
//! - `tools` - Web search and Python execution adapters
//! - `memory` - Conversation transcript
//! - `config` - Settings and the agent prompt template
//! - `agent` - Reasoning loop over a model with tool calling
//! - `assistant` - Per-session entry point (`query`, `clear`, transcript)
//! - `cli` - Interactive chat and one-shot commands
//!
//! # Example
//!
//! ```rust,no_run
//! use scout::assistant::ResearchAssistant;
//! use scout::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let mut assistant = ResearchAssistant::from_settings(&settings)?;
//!
//!     let answer = assistant.query("What is 17 * 23?").await;
//!     println!("{}", answer);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod assistant;
pub mod cli;
pub mod config;
pub mod error;
pub mod memory;
pub mod openai;
pub mod tools;

pub use assistant::ResearchAssistant;
pub use error::{Result, ScoutError};
