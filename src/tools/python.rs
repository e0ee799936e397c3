//! Python code execution tool.
//!
//! Each call runs in a fresh `python3 -I` process with a cleared environment
//! and an empty temporary working directory, under a hard wall-clock limit.

use super::Tool;
use crate::config::CodeSettings;
use crate::error::{Result, ScoutError};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, instrument};

/// Runs the program read from stdin with REPL semantics: a trailing
/// expression has its repr printed.
const DRIVER: &str = r#"
import ast, sys
source = sys.stdin.read()
tree = ast.parse(source, "<input>", "exec")
tail = None
if tree.body and isinstance(tree.body[-1], ast.Expr):
    tail = ast.Expression(tree.body.pop().value)
scope = {"__name__": "__main__"}
exec(compile(tree, "<input>", "exec"), scope)
if tail is not None:
    value = eval(compile(tail, "<input>", "eval"), scope)
    if value is not None:
        print(repr(value))
"#;

/// Python execution tool.
pub struct PythonRepl {
    interpreter: String,
    timeout: Duration,
    max_output_chars: usize,
}

impl PythonRepl {
    pub fn new(interpreter: &str) -> Self {
        Self {
            interpreter: interpreter.to_string(),
            timeout: Duration::from_secs(10),
            max_output_chars: 10_000,
        }
    }

    /// Create the tool from settings.
    pub fn from_settings(settings: &CodeSettings) -> Self {
        Self::new(&settings.interpreter)
            .with_timeout(Duration::from_secs(settings.timeout_secs))
            .with_max_output(settings.max_output_chars)
    }

    /// Set the wall-clock limit per execution.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the output truncation limit.
    pub fn with_max_output(mut self, max_chars: usize) -> Self {
        self.max_output_chars = max_chars;
        self
    }

    async fn execute(&self, code: &str) -> Result<String> {
        let workdir = tempfile::tempdir()?;

        let mut command = Command::new(&self.interpreter);
        command
            .arg("-I")
            .arg("-c")
            .arg(DRIVER)
            .current_dir(workdir.path())
            .env_clear()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(path) = std::env::var_os("PATH") {
            command.env("PATH", path);
        }

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScoutError::tool(
                    "python",
                    format!("Interpreter '{}' not found in PATH", self.interpreter),
                )
            } else {
                ScoutError::tool("python", format!("Failed to start interpreter: {}", e))
            }
        })?;

        let (mut stdin, stdout, stderr) =
            match (child.stdin.take(), child.stdout.take(), child.stderr.take()) {
                (Some(stdin), Some(stdout), Some(stderr)) => (stdin, stdout, stderr),
                _ => return Err(ScoutError::tool("python", "Interpreter pipes unavailable")),
            };

        // Enough bytes to hold `max_output_chars` characters plus one more
        let limit = (self.max_output_chars as u64)
            .saturating_mul(4)
            .saturating_add(1);

        let run = async move {
            stdin.write_all(code.as_bytes()).await?;
            drop(stdin);

            let (stdout, stderr) =
                tokio::join!(read_capped(stdout, limit), read_capped(stderr, limit));
            let (stdout, stderr) = (stdout?, stderr?);

            let overflowed = stdout.len() as u64 >= limit;
            if overflowed {
                debug!("Python output exceeded {} bytes, stopping", limit);
                if let Err(e) = child.start_kill() {
                    debug!("Interpreter already exited: {}", e);
                }
            }
            let status = child.wait().await?;
            Ok::<_, std::io::Error>(Captured {
                status,
                stdout,
                stderr,
                overflowed,
            })
        };

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| {
                ScoutError::tool(
                    "python",
                    format!("Execution timed out after {:?}", self.timeout),
                )
            })?
            .map_err(|e| ScoutError::tool("python", format!("Execution failed: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if output.overflowed {
            return Ok(truncate(&stdout, self.max_output_chars));
        }

        if !output.status.success() {
            let reason = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("process exited with an error")
                .trim()
                .to_string();
            debug!("Python stderr:\n{}", stderr);
            return Err(ScoutError::tool("python", reason));
        }

        let stdout = stdout.trim_end();
        if stdout.is_empty() {
            return Ok("Code executed successfully with no output.".to_string());
        }

        Ok(truncate(stdout, self.max_output_chars))
    }
}

struct Captured {
    status: std::process::ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    overflowed: bool,
}

/// Read a pipe to EOF or `limit` bytes, then close it.
async fn read_capped<R: AsyncRead + Unpin>(pipe: R, limit: u64) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    pipe.take(limit).read_to_end(&mut buf).await?;
    Ok(buf)
}

#[async_trait]
impl Tool for PythonRepl {
    fn name(&self) -> &str {
        "python"
    }

    fn description(&self) -> &str {
        "Execute Python code for calculations and data manipulation. \
        Returns printed output, or the value of the last expression."
    }

    fn argument(&self) -> &str {
        "code"
    }

    fn argument_description(&self) -> &str {
        "Python source code to run"
    }

    #[instrument(skip(self, code))]
    async fn invoke(&self, code: &str) -> Result<String> {
        let code = sanitize_input(code);
        if code.is_empty() {
            return Err(ScoutError::tool("python", "No code provided"));
        }
        self.execute(&code).await
    }
}

/// Strip surrounding whitespace, markdown fences and a leading `python` tag.
pub fn sanitize_input(code: &str) -> String {
    let mut s = code.trim_start_matches(|c: char| c.is_whitespace() || c == '`');

    if let Some(prefix) = s.get(..6) {
        let rest = &s[6..];
        if prefix.eq_ignore_ascii_case("python")
            && rest.chars().next().map_or(true, char::is_whitespace)
        {
            s = rest.trim_start();
        }
    }

    s.trim_end_matches(|c: char| c.is_whitespace() || c == '`')
        .to_string()
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars).collect();
        format!("{}\n... [output truncated]", head)
    }
}
