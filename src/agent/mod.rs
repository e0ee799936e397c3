//! Agent system for answering questions with tool calling.
//!
//! The [`Reasoner`] decides the next action for a prompt; the
//! [`AgentExecutor`] runs the bounded loop around it, calling tools and
//! feeding their results back until a final answer arrives.

mod executor;
mod reasoner;

pub use executor::{AgentExecutor, AgentOutcome, DEFAULT_MAX_ITERATIONS};
pub use reasoner::{Action, OpenAIReasoner, Prompt, Reasoner, Step, ToolRequest};

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted reasoner for exercising the loop without a model.

    use super::*;
    use crate::error::{Result, ScoutError};
    use crate::tools::ToolSpec;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a fixed list of actions and records every prompt it sees.
    pub struct ScriptedReasoner {
        script: Mutex<VecDeque<Action>>,
        repeat: Option<Action>,
        failure: Option<String>,
        seen: Mutex<Vec<Prompt>>,
    }

    impl ScriptedReasoner {
        pub fn new(script: Vec<Action>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                repeat: None,
                failure: None,
                seen: Mutex::new(Vec::new()),
            }
        }

        /// Return the same action forever.
        pub fn always(action: Action) -> Self {
            Self {
                repeat: Some(action),
                ..Self::new(Vec::new())
            }
        }

        /// Fail every step as if the model service were down.
        pub fn failing(message: &str) -> Self {
            Self {
                failure: Some(message.to_string()),
                ..Self::new(Vec::new())
            }
        }

        pub fn prompts(&self) -> Vec<Prompt> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Reasoner for ScriptedReasoner {
        async fn reason(&self, prompt: &Prompt, _tools: &[ToolSpec]) -> Result<Action> {
            self.seen.lock().unwrap().push(prompt.clone());

            if let Some(message) = &self.failure {
                return Err(ScoutError::Upstream(message.clone()));
            }

            self.script
                .lock()
                .unwrap()
                .pop_front()
                .or_else(|| self.repeat.clone())
                .ok_or_else(|| ScoutError::Agent("script exhausted".to_string()))
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }
}
