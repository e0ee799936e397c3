//! The model-facing half of the agent: one reasoning step per call.

use crate::error::{Result, ScoutError};
use crate::tools::ToolSpec;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall,
    FunctionObject,
};
use async_trait::async_trait;
use tracing::{debug, instrument};
use uuid::Uuid;

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequest {
    /// Provider-assigned call id.
    pub id: String,
    /// Requested tool name.
    pub name: String,
    /// Raw JSON arguments as emitted by the model.
    pub arguments: String,
}

impl ToolRequest {
    /// Create a request with a fresh call id.
    pub fn new(name: &str, arguments: &str) -> Self {
        Self {
            id: format!("call_{}", Uuid::new_v4().simple()),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }
}

/// One entry of the scratch log fed back to the model.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// A tool ran; `output` is its result or error text.
    Observation { request: ToolRequest, output: String },
    /// The previous reply was unusable; `instruction` tells the model how to fix it.
    Correction {
        request: Option<ToolRequest>,
        raw: String,
        instruction: String,
    },
}

/// Everything the model sees for one reasoning step.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    /// Rendered system instruction, including conversation history.
    pub system: String,
    /// The current user input.
    pub input: String,
    /// Tool calls and corrections made so far for this input.
    pub scratchpad: Vec<Step>,
}

/// What the model decided to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Call one or more tools.
    ToolCalls(Vec<ToolRequest>),
    /// Answer the user.
    Final(String),
    /// Output that is neither a usable tool call nor an answer.
    Malformed { raw: String, reason: String },
}

/// A model that picks the next action given a prompt and the available tools.
#[async_trait]
pub trait Reasoner: Send + Sync {
    /// Run one reasoning step.
    ///
    /// Errors are reserved for failures of the model service itself.
    async fn reason(&self, prompt: &Prompt, tools: &[ToolSpec]) -> Result<Action>;

    /// Model identifier, for display.
    fn model(&self) -> &str;
}

/// Reasoner backed by OpenAI chat completions with native tool calling.
pub struct OpenAIReasoner {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIReasoner {
    pub fn new(
        client: async_openai::Client<async_openai::config::OpenAIConfig>,
        model: &str,
        temperature: f32,
    ) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature,
        }
    }

    /// Convert a prompt into the chat message list.
    fn build_messages(prompt: &Prompt) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(prompt.system.clone())
                .build()
                .map_err(|e| ScoutError::Agent(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt.input.clone())
                .build()
                .map_err(|e| ScoutError::Agent(e.to_string()))?
                .into(),
        ];

        for step in &prompt.scratchpad {
            match step {
                Step::Observation { request, output } => {
                    Self::push_tool_exchange(&mut messages, request, output)?;
                }
                Step::Correction {
                    request: Some(request),
                    instruction,
                    ..
                } => {
                    Self::push_tool_exchange(&mut messages, request, instruction)?;
                }
                Step::Correction {
                    request: None,
                    raw,
                    instruction,
                } => {
                    if !raw.trim().is_empty() {
                        messages.push(
                            ChatCompletionRequestAssistantMessageArgs::default()
                                .content(raw.clone())
                                .build()
                                .map_err(|e| ScoutError::Agent(e.to_string()))?
                                .into(),
                        );
                    }
                    messages.push(
                        ChatCompletionRequestUserMessageArgs::default()
                            .content(instruction.clone())
                            .build()
                            .map_err(|e| ScoutError::Agent(e.to_string()))?
                            .into(),
                    );
                }
            }
        }

        Ok(messages)
    }

    /// Append an assistant tool call followed by its tool result.
    fn push_tool_exchange(
        messages: &mut Vec<ChatCompletionRequestMessage>,
        request: &ToolRequest,
        content: &str,
    ) -> Result<()> {
        let call = ChatCompletionMessageToolCall {
            id: request.id.clone(),
            r#type: ChatCompletionToolType::Function,
            function: FunctionCall {
                name: request.name.clone(),
                arguments: request.arguments.clone(),
            },
        };

        messages.push(
            ChatCompletionRequestAssistantMessageArgs::default()
                .tool_calls(vec![call])
                .build()
                .map_err(|e| ScoutError::Agent(e.to_string()))?
                .into(),
        );
        messages.push(
            ChatCompletionRequestToolMessageArgs::default()
                .tool_call_id(&request.id)
                .content(content.to_string())
                .build()
                .map_err(|e| ScoutError::Agent(e.to_string()))?
                .into(),
        );
        Ok(())
    }

    fn tool_definitions(tools: &[ToolSpec]) -> Vec<ChatCompletionTool> {
        tools
            .iter()
            .map(|t| ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function: FunctionObject {
                    name: t.name.clone(),
                    description: Some(t.description.clone()),
                    parameters: Some(t.parameters.clone()),
                    strict: None,
                },
            })
            .collect()
    }
}

#[async_trait]
impl Reasoner for OpenAIReasoner {
    #[instrument(skip(self, prompt, tools), fields(model = %self.model, steps = prompt.scratchpad.len()))]
    async fn reason(&self, prompt: &Prompt, tools: &[ToolSpec]) -> Result<Action> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(Self::build_messages(prompt)?)
            .tools(Self::tool_definitions(tools))
            .temperature(self.temperature)
            .build()
            .map_err(|e| ScoutError::Agent(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| ScoutError::Upstream(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ScoutError::Upstream("No response from model".to_string()))?;

        let tool_calls = choice.message.tool_calls.unwrap_or_default();
        if !tool_calls.is_empty() {
            debug!("Model requested {} tool call(s)", tool_calls.len());
            return Ok(Action::ToolCalls(
                tool_calls
                    .into_iter()
                    .map(|c| ToolRequest {
                        id: c.id,
                        name: c.function.name,
                        arguments: c.function.arguments,
                    })
                    .collect(),
            ));
        }

        match choice.message.content {
            Some(content) if !content.trim().is_empty() => Ok(Action::Final(content)),
            other => Ok(Action::Malformed {
                raw: other.unwrap_or_default(),
                reason: "the reply was empty".to_string(),
            }),
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}
