//! Doctor command - verify system requirements and configuration.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Scout Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("API Configuration").bold());
    let api_check = check_api_key(&settings.openai.api_key_env);
    api_check.print();
    checks.push(api_check);

    println!();

    println!("{}", style("Tools").bold());
    let interpreter_check = check_interpreter(&settings.code.interpreter);
    interpreter_check.print();
    checks.push(interpreter_check);

    println!();

    println!("{}", style("Configuration").bold());
    for check in [check_config_file(), check_settings(settings)] {
        check.print();
        checks.push(check);
    }

    println!();

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Scout.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Scout is ready to use.");
    }

    Ok(())
}

/// Check if the API key variable is set.
fn check_api_key(var: &str) -> CheckResult {
    match std::env::var(var) {
        Ok(key) if key.starts_with("sk-") && key.chars().count() > 20 => {
            let chars: Vec<char> = key.chars().collect();
            let masked = format!(
                "{}...{}",
                chars[..7].iter().collect::<String>(),
                chars[chars.len() - 4..].iter().collect::<String>()
            );
            CheckResult::ok(var, &format!("configured ({})", masked))
        }
        Ok(key) if key.trim().is_empty() => {
            CheckResult::error(var, "empty", &format!("Set with: export {}='sk-...'", var))
        }
        Ok(_) => CheckResult::warning(
            var,
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        Err(_) => CheckResult::error(var, "not set", &format!("Set with: export {}='sk-...'", var)),
    }
}

/// Check the code execution interpreter.
fn check_interpreter(interpreter: &str) -> CheckResult {
    match preflight::check_interpreter(interpreter) {
        Ok(version) => CheckResult::ok(interpreter, &version),
        Err(e) => CheckResult::error(interpreter, &e.to_string(), install_hint_python()),
    }
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: scout config edit",
        )
    }
}

/// Check that the loaded settings are valid.
fn check_settings(settings: &Settings) -> CheckResult {
    match settings.validate() {
        Ok(()) => CheckResult::ok(
            "Agent",
            &format!(
                "{} (temperature {}, {} steps max)",
                settings.agent.model, settings.agent.temperature, settings.agent.max_iterations
            ),
        ),
        Err(e) => CheckResult::error("Agent", &e.to_string(), "Fix with: scout config edit"),
    }
}

/// Platform-specific install hint for Python.
fn install_hint_python() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install python"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install python3 (or your package manager)"
    } else {
        "Install from: https://www.python.org/downloads/"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_api_key_masked() {
        std::env::set_var("SCOUT_DOCTOR_KEY", "sk-abcdefghijklmnopqrstuvwxyz");
        let result = check_api_key("SCOUT_DOCTOR_KEY");
        assert_eq!(result.status, CheckStatus::Ok);
        assert_eq!(result.message, "configured (sk-abcd...wxyz)");
    }

    #[test]
    fn test_api_key_missing() {
        let result = check_api_key("SCOUT_DOCTOR_KEY_UNSET");
        assert_eq!(result.status, CheckStatus::Error);
    }

    #[test]
    fn test_invalid_settings_reported() {
        let mut settings = Settings::default();
        settings.agent.max_iterations = 0;
        assert_eq!(check_settings(&settings).status, CheckStatus::Error);
    }
}
