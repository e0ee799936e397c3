//! The research assistant: single entry point for a chat session.
//!
//! A [`ResearchAssistant`] owns the agent, its tools and the conversation
//! transcript for exactly one session. `query` always returns text; every
//! failure is turned into a user-facing message and recorded in the
//! transcript like any other answer.

use crate::agent::{AgentExecutor, OpenAIReasoner};
use crate::config::{PromptTemplate, Settings};
use crate::error::{Result, ScoutError};
use crate::memory::{Transcript, Turn};
use crate::openai::create_client;
use crate::tools::{ToolInvocation, ToolSet};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

/// Reply when the reasoning loop hits its step limit.
pub const MAX_ITERATIONS_MESSAGE: &str = "I'm sorry, I couldn't reach an answer within the \
allowed number of reasoning steps. Please try rephrasing or narrowing your question.";

/// Reply prefix when the model or a network dependency is unavailable.
pub const UPSTREAM_MESSAGE: &str =
    "Sorry, I couldn't reach the language model service right now. Please try again in a moment.";

/// Reply when the model returns an empty final answer.
const EMPTY_ANSWER: &str = "I don't have an answer to that.";

/// Why a query did not produce a model answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The loop used every allowed step without a final answer.
    MaxIterations,
    /// The model service or network failed.
    Upstream,
    /// Anything else.
    Internal,
}

impl From<&ScoutError> for FailureKind {
    fn from(err: &ScoutError) -> Self {
        match err {
            ScoutError::MaxIterationsExceeded { .. } => FailureKind::MaxIterations,
            e if e.is_upstream() => FailureKind::Upstream,
            _ => FailureKind::Internal,
        }
    }
}

/// Answer to a single query, with the tool calls that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    /// Text shown to the user. Never empty.
    pub text: String,
    /// Tool calls made while answering, including those of a query that hit
    /// the step limit.
    pub tool_calls: Vec<ToolInvocation>,
    /// Reasoning steps used (0 when the model service failed).
    pub iterations: usize,
    /// Set when `text` is a failure message.
    pub failure: Option<FailureKind>,
}

impl Reply {
    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}

/// One assistant per chat session.
pub struct ResearchAssistant {
    session_id: Uuid,
    executor: AgentExecutor,
    transcript: Transcript,
}

impl ResearchAssistant {
    /// Wrap an already configured executor.
    pub fn new(executor: AgentExecutor) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            executor,
            transcript: Transcript::new(),
        }
    }

    /// Build the OpenAI-backed assistant with search and Python tools.
    ///
    /// Fails with `ScoutError::Config` if the settings are invalid or the API
    /// key is missing. No network request is made here.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        let api_key = settings.api_key()?;

        let client = create_client(
            &api_key,
            settings.openai.base_url.as_deref(),
            Duration::from_secs(settings.agent.request_timeout_secs),
        )?;
        let reasoner = Arc::new(OpenAIReasoner::new(
            client,
            &settings.agent.model,
            settings.agent.temperature,
        ));

        let tools = ToolSet::from_settings(settings)?;
        let template = settings
            .prompts
            .system
            .as_deref()
            .map(PromptTemplate::new)
            .unwrap_or_default();

        let executor = AgentExecutor::new(reasoner, tools, template)
            .with_max_iterations(settings.agent.max_iterations);

        let assistant = Self::new(executor);
        info!(
            "Assistant ready (session {}, model {})",
            assistant.session_id, settings.agent.model
        );
        Ok(assistant)
    }

    /// Answer a question, returning only the text.
    pub async fn query(&mut self, input: &str) -> String {
        self.ask(input).await.text
    }

    /// Answer a question, returning the text and structured tool calls.
    ///
    /// The user input and the reply are appended to the transcript in that
    /// order, whether or not the agent succeeded.
    pub async fn ask(&mut self, input: &str) -> Reply {
        let span = info_span!("query", session = %self.session_id, turn = self.transcript.len() / 2 + 1);

        let result = self
            .executor
            .invoke(input, self.transcript.turns())
            .instrument(span)
            .await;

        let reply = match result {
            Ok(outcome) => {
                let text = if outcome.output.trim().is_empty() {
                    EMPTY_ANSWER.to_string()
                } else {
                    outcome.output
                };
                Reply {
                    text,
                    tool_calls: outcome.tool_calls,
                    iterations: outcome.iterations,
                    failure: None,
                }
            }
            Err(e) => {
                error!("Query failed: {}", e);
                let text = failure_message(&e);
                let failure = Some(FailureKind::from(&e));
                let (tool_calls, iterations) = match e {
                    ScoutError::MaxIterationsExceeded { steps, tool_calls } => (tool_calls, steps),
                    _ => (Vec::new(), 0),
                };
                Reply {
                    text,
                    tool_calls,
                    iterations,
                    failure,
                }
            }
        };

        self.transcript.push_user(input);
        self.transcript.push_assistant(reply.text.clone());
        reply
    }

    /// Forget the conversation so far.
    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    /// The conversation so far, oldest first.
    pub fn transcript(&self) -> &[Turn] {
        self.transcript.turns()
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn model(&self) -> &str {
        self.executor.model()
    }

    pub fn max_iterations(&self) -> usize {
        self.executor.max_iterations()
    }

    /// Names of the available tools.
    pub fn tool_names(&self) -> Vec<String> {
        self.executor.tools().names()
    }
}

/// User-facing text for a failed query.
pub fn failure_message(err: &ScoutError) -> String {
    match FailureKind::from(err) {
        FailureKind::MaxIterations => MAX_ITERATIONS_MESSAGE.to_string(),
        FailureKind::Upstream => format!("{} ({})", UPSTREAM_MESSAGE, err),
        FailureKind::Internal => format!("Sorry, I encountered an error: {}", err),
    }
}

/// Per-tool call counts, fed from structured tool call records.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolUsage {
    counts: BTreeMap<String, usize>,
}

impl ToolUsage {
    /// Start every named tool at zero.
    pub fn new(names: &[String]) -> Self {
        Self {
            counts: names.iter().map(|n| (n.clone(), 0)).collect(),
        }
    }

    /// Count the calls from one reply.
    pub fn record(&mut self, calls: &[ToolInvocation]) {
        for call in calls {
            *self.counts.entry(call.name.clone()).or_insert(0) += 1;
        }
    }

    pub fn count(&self, name: &str) -> usize {
        self.counts.get(name).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Reset every count to zero.
    pub fn reset(&mut self) {
        self.counts.values_mut().for_each(|v| *v = 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::ScriptedReasoner;
    use crate::agent::{Action, ToolRequest};
    use crate::memory::Role;
    use crate::tools::testing::{stub_tools, StubTool};

    fn assistant(reasoner: ScriptedReasoner) -> (Arc<ScriptedReasoner>, ResearchAssistant) {
        let reasoner = Arc::new(reasoner);
        let tools = stub_tools(
            StubTool::new("search", "query")
                .reply("asdchaiuhsd8232", "no results found")
                .otherwise("Rust 1.0 was released in May 2015."),
            StubTool::new("python", "code").reply("17*23", "391"),
        );
        let executor = AgentExecutor::new(reasoner.clone(), tools, PromptTemplate::default());
        (reasoner, ResearchAssistant::new(executor))
    }

    fn call(name: &str, arguments: &str) -> Action {
        Action::ToolCalls(vec![ToolRequest::new(name, arguments)])
    }

    #[tokio::test]
    async fn test_search_with_no_results() {
        let (_, mut assistant) = assistant(ScriptedReasoner::new(vec![
            call("search", r#"{"query": "asdchaiuhsd8232"}"#),
            Action::Final("I couldn't find relevant information".to_string()),
        ]));

        let answer = assistant.query("What is asdchaiuhsd8232?").await;
        assert!(answer.contains("couldn't find"));
        assert_eq!(
            assistant.transcript()[0],
            Turn {
                role: Role::User,
                content: "What is asdchaiuhsd8232?".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_code_execution_answer() {
        let (reasoner, mut assistant) = assistant(ScriptedReasoner::new(vec![
            call("python", r#"{"code": "17*23"}"#),
            Action::Final("17 * 23 is 391.".to_string()),
        ]));

        let reply = assistant.ask("What is 17 * 23?").await;
        assert!(reply.text.contains("391"));
        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(reply.tool_calls[0].output, "391");
        assert!(!reply.is_failure());

        match &reasoner.prompts()[1].scratchpad[0] {
            crate::agent::Step::Observation { output, .. } => assert_eq!(output, "391"),
            other => panic!("Expected observation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transcript_grows_by_two_on_success() {
        let (_, mut assistant) = assistant(ScriptedReasoner::new(vec![Action::Final(
            "Hello!".to_string(),
        )]));

        let answer = assistant.query("Hi").await;
        assert_eq!(answer, "Hello!");
        assert_eq!(assistant.transcript().len(), 2);
        assert_eq!(assistant.transcript()[0], Turn::user("Hi"));
        assert_eq!(assistant.transcript()[1], Turn::assistant("Hello!"));
    }

    #[tokio::test]
    async fn test_iteration_cap_message() {
        let (_, mut assistant) = assistant(ScriptedReasoner::always(call(
            "search",
            r#"{"query": "again"}"#,
        )));

        let reply = assistant.ask("Never stop searching").await;
        assert_eq!(reply.text, MAX_ITERATIONS_MESSAGE);
        assert_eq!(reply.failure, Some(FailureKind::MaxIterations));
        assert_eq!(reply.iterations, 5);
        assert_eq!(reply.tool_calls.len(), 5);

        let mut usage = ToolUsage::new(&assistant.tool_names());
        usage.record(&reply.tool_calls);
        assert_eq!(usage.count("search"), 5);
        assert_eq!(usage.count("python"), 0);
        assert_eq!(assistant.transcript().len(), 2);
        assert_eq!(assistant.transcript()[1], Turn::assistant(MAX_ITERATIONS_MESSAGE));
    }

    #[tokio::test]
    async fn test_upstream_failure_message_is_distinct() {
        let (_, mut assistant) = assistant(ScriptedReasoner::failing("connection refused"));

        let reply = assistant.ask("Anything").await;
        assert!(reply.text.starts_with(UPSTREAM_MESSAGE));
        assert_ne!(reply.text, MAX_ITERATIONS_MESSAGE);
        assert_eq!(reply.failure, Some(FailureKind::Upstream));
        assert_eq!(assistant.transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_internal_failure_still_answers() {
        // Empty script: the reasoner reports an agent error on the first step
        let (_, mut assistant) = assistant(ScriptedReasoner::new(vec![]));

        let answer = assistant.query("Anything").await;
        assert!(answer.starts_with("Sorry, I encountered an error"));
        assert_eq!(assistant.transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_answer_is_replaced() {
        let (_, mut assistant) = assistant(ScriptedReasoner::new(vec![Action::Final(
            "   ".to_string(),
        )]));

        let answer = assistant.query("Say nothing").await;
        assert_eq!(answer, EMPTY_ANSWER);
    }

    #[tokio::test]
    async fn test_clear_resets_history_context() {
        let (reasoner, mut assistant) = assistant(ScriptedReasoner::new(vec![
            Action::Final("first".to_string()),
            Action::Final("second".to_string()),
        ]));

        assistant.query("one").await;
        assistant.clear();
        assert!(assistant.transcript().is_empty());
        assistant.clear();
        assert!(assistant.transcript().is_empty());

        assistant.query("two").await;
        assert_eq!(assistant.transcript().len(), 2);
        let prompts = reasoner.prompts();
        assert!(prompts[1].system.contains("(no previous conversation)"));
        assert!(!prompts[1].system.contains("User: one"));
    }

    #[tokio::test]
    async fn test_history_carries_between_queries() {
        let (reasoner, mut assistant) = assistant(ScriptedReasoner::new(vec![
            Action::Final("first".to_string()),
            Action::Final("second".to_string()),
        ]));

        assistant.query("one").await;
        assistant.query("two").await;

        let prompts = reasoner.prompts();
        assert!(prompts[1].system.contains("User: one\nAssistant: first"));
        assert_eq!(prompts[1].input, "two");
        assert_eq!(assistant.transcript().len(), 4);
    }

    #[test]
    fn test_missing_credential_is_config_error() {
        let mut settings = Settings::default();
        settings.openai.api_key_env = "SCOUT_TEST_UNSET_API_KEY".to_string();

        let result = ResearchAssistant::from_settings(&settings);
        assert!(matches!(result, Err(ScoutError::Config(_))));
    }

    #[test]
    fn test_invalid_settings_rejected_before_credentials() {
        let mut settings = Settings::default();
        settings.agent.temperature = 2.0;

        let result = ResearchAssistant::from_settings(&settings);
        assert!(matches!(result, Err(ScoutError::Config(_))));
    }

    #[test]
    fn test_from_settings_with_credential() {
        std::env::set_var("SCOUT_TEST_PRESENT_API_KEY", "sk-test");
        let mut settings = Settings::default();
        settings.openai.api_key_env = "SCOUT_TEST_PRESENT_API_KEY".to_string();
        settings.agent.max_iterations = 7;

        let assistant = match ResearchAssistant::from_settings(&settings) {
            Ok(assistant) => assistant,
            Err(e) => panic!("construction failed: {}", e),
        };
        assert_eq!(assistant.model(), "gpt-3.5-turbo");
        assert_eq!(assistant.max_iterations(), 7);
        assert_eq!(assistant.tool_names(), vec!["search", "python"]);
        assert!(assistant.transcript().is_empty());
    }

    #[test]
    fn test_tool_usage_counts() {
        let mut usage = ToolUsage::new(&["search".to_string(), "python".to_string()]);
        assert_eq!(usage.total(), 0);

        let call = ToolInvocation {
            name: "python".to_string(),
            input: "1+1".to_string(),
            output: "2".to_string(),
            succeeded: true,
            started_at: chrono::Utc::now(),
            duration_ms: 3,
        };
        usage.record(&[call.clone(), call]);

        assert_eq!(usage.count("python"), 2);
        assert_eq!(usage.count("search"), 0);
        assert_eq!(usage.total(), 2);

        usage.reset();
        assert_eq!(usage.total(), 0);
        assert_eq!(usage.iter().count(), 2);
    }
}
