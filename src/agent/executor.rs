//! Bounded reasoning loop over a [`Reasoner`] and a [`ToolSet`].

use super::reasoner::{Action, Reasoner, Step, ToolRequest};
use crate::config::PromptTemplate;
use crate::error::{Result, ScoutError};
use crate::memory::Turn;
use crate::tools::{ToolInvocation, ToolSet};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Default maximum number of reasoning steps per query.
pub const DEFAULT_MAX_ITERATIONS: usize = 5;

/// Drives the model until it produces a final answer or runs out of steps.
pub struct AgentExecutor {
    reasoner: Arc<dyn Reasoner>,
    tools: ToolSet,
    template: PromptTemplate,
    max_iterations: usize,
}

impl AgentExecutor {
    /// Create an executor with the default iteration cap.
    pub fn new(reasoner: Arc<dyn Reasoner>, tools: ToolSet, template: PromptTemplate) -> Self {
        Self {
            reasoner,
            tools,
            template,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Set maximum iterations for the agent loop.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn model(&self) -> &str {
        self.reasoner.model()
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    /// Answer `input` given the prior conversation.
    ///
    /// Tool failures and malformed model output are fed back into the loop.
    /// Fails with `MaxIterationsExceeded`, holding the tool calls made so far,
    /// when no final answer arrives within the cap, and with the reasoner's error when the model service fails.
    #[instrument(skip(self, input, history), fields(turns = history.len()))]
    pub async fn invoke(&self, input: &str, history: &[Turn]) -> Result<AgentOutcome> {
        let specs = self.tools.specs();
        let mut prompt = self.template.render(&specs, history, input, &[]);
        let mut tool_calls = Vec::new();

        for iteration in 1..=self.max_iterations {
            debug!("Agent iteration {}", iteration);

            match self.reasoner.reason(&prompt, &specs).await? {
                Action::Final(output) => {
                    info!(
                        "Agent finished in {} iteration(s) with {} tool call(s)",
                        iteration,
                        tool_calls.len()
                    );
                    return Ok(AgentOutcome {
                        output,
                        tool_calls,
                        iterations: iteration,
                    });
                }
                Action::ToolCalls(requests) if requests.is_empty() => {
                    prompt.scratchpad.push(self.correction(
                        None,
                        String::new(),
                        "no tool call or answer was given",
                    ));
                }
                Action::ToolCalls(requests) => {
                    for request in requests {
                        let step = self.run_request(request, &mut tool_calls).await;
                        prompt.scratchpad.push(step);
                    }
                }
                Action::Malformed { raw, reason } => {
                    warn!("Malformed model output: {}", reason);
                    prompt.scratchpad.push(self.correction(None, raw, &reason));
                }
            }
        }

        warn!(
            "Agent exceeded maximum iterations ({})",
            self.max_iterations
        );
        Err(ScoutError::MaxIterationsExceeded {
            steps: self.max_iterations,
            tool_calls,
        })
    }

    /// Execute one requested tool call and turn it into a scratch step.
    async fn run_request(
        &self,
        request: ToolRequest,
        tool_calls: &mut Vec<ToolInvocation>,
    ) -> Step {
        match self.tools.resolve(&request.name, &request.arguments) {
            Ok((tool, input)) => {
                let invocation = self.tools.run(&tool, &input).await;
                let output = invocation.output.clone();
                tool_calls.push(invocation);
                Step::Observation { request, output }
            }
            Err(e) => {
                warn!("Unusable tool call {}({}): {}", request.name, request.arguments, e);
                let raw = format!("{}({})", request.name, request.arguments);
                self.correction(Some(request), raw, &e.to_string())
            }
        }
    }

    fn correction(&self, request: Option<ToolRequest>, raw: String, reason: &str) -> Step {
        Step::Correction {
            request,
            raw,
            instruction: format!(
                "Your previous reply could not be used: {}. \
                Either call one of the available tools ({}) with valid JSON arguments, \
                or reply with your final answer as plain text.",
                reason,
                self.tools.names().join(", ")
            ),
        }
    }
}

/// Result of a successful agent run.
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    /// The final answer text.
    pub output: String,
    /// Every tool call made, in order.
    pub tool_calls: Vec<ToolInvocation>,
    /// Number of reasoning steps used.
    pub iterations: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::ScriptedReasoner;
    use crate::tools::testing::{stub_tools, StubTool};

    fn tools() -> ToolSet {
        stub_tools(
            StubTool::new("search", "query").otherwise("No results found for: anything"),
            StubTool::new("python", "code").reply("17*23", "391"),
        )
    }

    fn executor(reasoner: ScriptedReasoner) -> (Arc<ScriptedReasoner>, AgentExecutor) {
        let reasoner = Arc::new(reasoner);
        let executor = AgentExecutor::new(reasoner.clone(), tools(), PromptTemplate::default());
        (reasoner, executor)
    }

    #[tokio::test]
    async fn test_direct_answer() {
        let (_, executor) = executor(ScriptedReasoner::new(vec![Action::Final(
            "Paris".to_string(),
        )]));

        let outcome = executor.invoke("Capital of France?", &[]).await.unwrap();
        assert_eq!(outcome.output, "Paris");
        assert_eq!(outcome.iterations, 1);
        assert!(outcome.tool_calls.is_empty());
    }

    #[tokio::test]
    async fn test_tool_result_is_fed_back() {
        let (reasoner, executor) = executor(ScriptedReasoner::new(vec![
            Action::ToolCalls(vec![ToolRequest::new("python", r#"{"code": "17*23"}"#)]),
            Action::Final("17 * 23 = 391".to_string()),
        ]));

        let outcome = executor.invoke("What is 17 * 23?", &[]).await.unwrap();
        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.tool_calls.len(), 1);
        assert_eq!(outcome.tool_calls[0].name, "python");

        let prompts = reasoner.prompts();
        match &prompts[1].scratchpad[0] {
            Step::Observation { output, .. } => assert_eq!(output, "391"),
            other => panic!("Expected observation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_iteration_cap() {
        let (reasoner, executor) = executor(ScriptedReasoner::always(Action::ToolCalls(vec![
            ToolRequest::new("search", r#"{"query": "more"}"#),
        ])));
        let executor = executor.with_max_iterations(3);

        let err = executor.invoke("loop forever", &[]).await.unwrap_err();
        match err {
            ScoutError::MaxIterationsExceeded { steps, tool_calls } => {
                assert_eq!(steps, 3);
                assert_eq!(tool_calls.len(), 3);
                assert!(tool_calls.iter().all(|c| c.name == "search"));
            }
            other => panic!("Expected iteration cap, got {:?}", other),
        }
        assert_eq!(reasoner.prompts().len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_tool_gets_correction() {
        let (reasoner, executor) = executor(ScriptedReasoner::new(vec![
            Action::ToolCalls(vec![ToolRequest::new("calculator", r#"{"x": 1}"#)]),
            Action::Final("done".to_string()),
        ]));

        let outcome = executor.invoke("hi", &[]).await.unwrap();
        assert_eq!(outcome.output, "done");
        assert!(outcome.tool_calls.is_empty());

        match &reasoner.prompts()[1].scratchpad[0] {
            Step::Correction {
                request: Some(request),
                instruction,
                ..
            } => {
                assert_eq!(request.name, "calculator");
                assert!(instruction.contains("Unknown tool"));
                assert!(instruction.contains("search, python"));
            }
            other => panic!("Expected correction, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_output_is_retried_within_cap() {
        let (_, executor) = executor(ScriptedReasoner::always(Action::Malformed {
            raw: "Action: ???".to_string(),
            reason: "unparseable".to_string(),
        }));

        let err = executor.invoke("hi", &[]).await.unwrap_err();
        assert!(matches!(
            err,
            ScoutError::MaxIterationsExceeded { steps: 5, ref tool_calls } if tool_calls.is_empty()
        ));
    }

    #[tokio::test]
    async fn test_upstream_error_propagates() {
        let (_, executor) = executor(ScriptedReasoner::failing("connection refused"));

        let err = executor.invoke("hi", &[]).await.unwrap_err();
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn test_history_is_rendered() {
        let (reasoner, executor) = executor(ScriptedReasoner::new(vec![Action::Final(
            "ok".to_string(),
        )]));
        let history = vec![Turn::user("earlier question"), Turn::assistant("earlier answer")];

        executor.invoke("follow up", &history).await.unwrap();
        assert!(reasoner.prompts()[0].system.contains("User: earlier question"));
    }
}
