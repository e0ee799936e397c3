//! Ask command implementation.

use crate::assistant::ResearchAssistant;
use crate::cli::preflight;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    model: Option<String>,
    max_iterations: Option<usize>,
    json: bool,
    mut settings: Settings,
) -> Result<()> {
    if let Some(model) = model {
        settings.agent.model = model;
    }
    if let Some(max) = max_iterations {
        settings.agent.max_iterations = max;
    }

    // Pre-flight checks
    if let Err(e) = preflight::check(&settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'scout doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let mut assistant = ResearchAssistant::from_settings(&settings)?;

    let spinner = Output::spinner("Researching...");
    let reply = assistant.ask(question).await;
    spinner.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
        return Ok(());
    }

    println!("\n{}\n", reply.text);

    if !reply.tool_calls.is_empty() {
        Output::header(&format!("Tool calls ({})", reply.tool_calls.len()));
        for call in &reply.tool_calls {
            Output::tool_call(call);
        }
        println!();
    }

    if reply.is_failure() {
        anyhow::bail!("query did not complete");
    }

    Output::info(&format!("Completed in {} step(s)", reply.iterations));
    Ok(())
}
