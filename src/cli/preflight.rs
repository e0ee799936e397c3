//! Pre-flight checks before starting a session.
//!
//! Validates that credentials and external tools are available before
//! the first question is asked.

use crate::config::Settings;
use crate::error::{Result, ScoutError};
use std::process::Command;

/// Check that settings are usable and an API key is configured.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(settings: &Settings) -> Result<()> {
    settings.validate()?;
    settings.api_key()?;
    Ok(())
}

/// Check that the configured Python interpreter runs.
pub fn check_interpreter(interpreter: &str) -> Result<String> {
    match Command::new(interpreter).arg("--version").output() {
        Ok(output) if output.status.success() => {
            // Older Pythons print the version on stderr
            let version = if output.stdout.is_empty() {
                String::from_utf8_lossy(&output.stderr).trim().to_string()
            } else {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            };
            Ok(version)
        }
        Ok(_) => Err(ScoutError::Config(format!(
            "{} is installed but not working correctly",
            interpreter
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ScoutError::Config(format!(
            "{} not found. Please install it and ensure it's in your PATH.",
            interpreter
        ))),
        Err(e) => Err(ScoutError::Config(format!("{}: {}", interpreter, e))),
    }
}
