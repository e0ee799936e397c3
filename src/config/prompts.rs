//! Prompt template for the research agent.
//!
//! The system instruction is composed once when the assistant is built.
//! Conversation history is substituted into it on every query.

use crate::agent::{Prompt, Step};
use crate::memory::{Transcript, Turn};
use crate::tools::ToolSpec;
use std::collections::HashMap;

/// Default system instruction.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You're a helpful research assistant. Today is {{date}}.

You can answer directly from your own knowledge, or use one of these tools:
{{tools}}

Guidelines:
- Use 'search' for current events, recent facts, or anything you are unsure about
- Use 'python' for arithmetic, data manipulation, or anything that needs exact computation
- Call one tool at a time and read its result before deciding the next step
- If a tool reports an error, adjust your input or try a different approach
- When you have enough information, reply with the final answer in plain text
- If nothing relevant can be found, say so honestly

Conversation so far:
{{history}}"#;

/// System instruction with placeholders for tools and history.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    system: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}

impl PromptTemplate {
    pub fn new(system: &str) -> Self {
        Self {
            system: system.to_string(),
        }
    }

    /// The raw, unrendered instruction.
    pub fn system(&self) -> &str {
        &self.system
    }

    /// Build the full prompt for one reasoning step.
    pub fn render(
        &self,
        tools: &[ToolSpec],
        history: &[Turn],
        input: &str,
        scratchpad: &[Step],
    ) -> Prompt {
        let tool_list = tools
            .iter()
            .map(|t| format!("- {}: {}", t.name, t.description))
            .collect::<Vec<_>>()
            .join("\n");

        let mut vars = HashMap::new();
        vars.insert("tools".to_string(), tool_list);
        vars.insert(
            "date".to_string(),
            chrono::Utc::now().format("%Y-%m-%d").to_string(),
        );

        // History goes in last so placeholders typed by the user stay literal
        let system = Self::substitute(&self.system, &vars)
            .replace("{{history}}", &Transcript::render(history));

        Prompt {
            system,
            input: input.to_string(),
            scratchpad: scratchpad.to_vec(),
        }
    }

    /// Replace `{{name}}` placeholders with the given values.
    pub fn substitute(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs() -> Vec<ToolSpec> {
        vec![ToolSpec {
            name: "search".to_string(),
            description: "For current information".to_string(),
            parameters: serde_json::json!({}),
        }]
    }

    #[test]
    fn test_substitute() {
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result =
            PromptTemplate::substitute("Hello {{name}}, you have {{count}} messages.", &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_render_includes_tools_and_history() {
        let template = PromptTemplate::default();
        let history = vec![Turn::user("Who wrote Dune?"), Turn::assistant("Frank Herbert.")];

        let prompt = template.render(&specs(), &history, "When?", &[]);
        assert!(prompt.system.contains("- search: For current information"));
        assert!(prompt.system.contains("User: Who wrote Dune?"));
        assert!(prompt.system.contains("Assistant: Frank Herbert."));
        assert!(!prompt.system.contains("{{"));
        assert_eq!(prompt.input, "When?");
    }

    #[test]
    fn test_render_keeps_placeholders_in_history_literal() {
        let template = PromptTemplate::default();
        let history = vec![
            Turn::user("please print {{date}} and {{tools}} literally"),
            Turn::assistant("Sure: {{history}}"),
        ];

        for _ in 0..50 {
            let prompt = template.render(&specs(), &history, "again", &[]);
            assert!(prompt
                .system
                .contains("User: please print {{date}} and {{tools}} literally"));
            assert!(prompt.system.contains("Assistant: Sure: {{history}}"));
            assert_eq!(prompt.system.matches("- search: For current information").count(), 1);
        }
    }

    #[test]
    fn test_render_empty_history() {
        let prompt = PromptTemplate::default().render(&specs(), &[], "hi", &[]);
        assert!(prompt.system.contains("(no previous conversation)"));
    }
}
