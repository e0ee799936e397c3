//! Interactive chat command.

use crate::assistant::{ResearchAssistant, ToolUsage};
use crate::cli::preflight;
use crate::cli::Output;
use crate::config::Settings;
use crate::memory::Role;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(model: Option<String>, mut settings: Settings) -> Result<()> {
    if let Some(model) = model {
        settings.agent.model = model;
    }

    // Pre-flight checks
    if let Err(e) = preflight::check(&settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'scout doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let mut session = ChatSession::new(ResearchAssistant::from_settings(&settings)?);

    println!("\n{}", style("Scout").bold().cyan());
    println!(
        "{}\n",
        style("Ask anything. Commands: 'clear', 'history', 'stats', 'exit'.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            // EOF
            println!();
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        match input.to_ascii_lowercase().as_str() {
            "exit" | "quit" => {
                Output::info("Goodbye!");
                break;
            }
            "clear" => {
                session.clear();
                Output::info("Conversation history cleared.");
                continue;
            }
            "history" => {
                session.print_history();
                continue;
            }
            "stats" => {
                session.print_stats();
                continue;
            }
            _ => {}
        }

        session.send(input).await;
    }

    Ok(())
}

/// State of one interactive session: the assistant and its tool counters.
struct ChatSession {
    assistant: ResearchAssistant,
    usage: ToolUsage,
}

impl ChatSession {
    fn new(assistant: ResearchAssistant) -> Self {
        let usage = ToolUsage::new(&assistant.tool_names());
        Self { assistant, usage }
    }

    /// Ask the assistant and print the reply.
    async fn send(&mut self, input: &str) {
        let spinner = Output::spinner("Researching...");
        let reply = self.assistant.ask(input).await;
        spinner.finish_and_clear();

        for call in &reply.tool_calls {
            Output::tool_call(call);
        }
        self.usage.record(&reply.tool_calls);

        let label = if reply.is_failure() {
            style("Scout:").red().bold()
        } else {
            style("Scout:").cyan().bold()
        };
        println!("\n{} {}\n", label, reply.text);
    }

    fn clear(&mut self) {
        self.assistant.clear();
        self.usage.reset();
    }

    fn print_history(&self) {
        let transcript = self.assistant.transcript();
        if transcript.is_empty() {
            Output::info("No messages yet.");
            return;
        }

        Output::header(&format!("History ({} messages)", transcript.len()));
        for turn in transcript {
            let who = match turn.role {
                Role::User => style("You:").green().bold(),
                Role::Assistant => style("Scout:").cyan().bold(),
            };
            println!("{} {}", who, turn.content);
        }
        println!();
    }

    fn print_stats(&self) {
        Output::header("Session");
        Output::kv("Session", &self.assistant.session_id().to_string());
        Output::kv("Model", self.assistant.model());
        Output::kv("Max steps", &self.assistant.max_iterations().to_string());
        Output::kv("Messages", &self.assistant.transcript().len().to_string());

        Output::header("Tool usage");
        for (name, count) in self.usage.iter() {
            Output::kv(name, &format!("{} use(s)", count));
        }
        println!();
    }
}
