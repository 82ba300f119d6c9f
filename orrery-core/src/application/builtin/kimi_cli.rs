use crate::application::tooling::{InputSchema, LocalTool, ToolArgs, ToolError};
use async_trait::async_trait;
use serde_json::json;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

pub(super) const NAME: &str = "kimi_cli";

const INSTALL_HINT: &str = "uv tool install --python 3.13 kimi-cli";

/// Delegates terminal work to the Kimi CLI agent by piping the prompt to
/// `kimi --non-interactive`.
///
/// Every failure mode is reported as text so the model can react to it.
pub struct KimiCli {
    program: PathBuf,
    timeout: Duration,
}

impl KimiCli {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    async fn run(&self, prompt: &str) -> std::io::Result<Option<std::process::Output>> {
        let mut child = Command::new(&self.program)
            .arg("--non-interactive")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            // The CLI may exit before reading its input; its exit status tells the rest.
            if let Err(err) = stdin.write_all(format!("{prompt}\n").as_bytes()).await {
                debug!(%err, "Kimi CLI closed stdin early");
            }
        }

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output.map(Some),
            Err(_) => Ok(None),
        }
    }
}

impl Default for KimiCli {
    fn default() -> Self {
        Self::new("kimi", Duration::from_secs(300))
    }
}

#[async_trait]
impl LocalTool for KimiCli {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Execute complex terminal operations using the Kimi CLI agent. Use it for \
         multi-step terminal operations or shell and system administration tasks that \
         need reasoning. The prompt describes what to accomplish in the terminal. \
         Kimi CLI must be installed first: uv tool install --python 3.13 kimi-cli"
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::from_value(json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "The task description or question to send to Kimi CLI agent"
                }
            },
            "required": ["prompt"]
        }))
    }

    async fn call(&self, args: ToolArgs) -> Result<String, ToolError> {
        let prompt = args.str("prompt")?;
        debug!(program = %self.program.display(), "Running Kimi CLI");

        let output = match self.run(prompt).await {
            Ok(Some(output)) => output,
            Ok(None) => {
                warn!(timeout = ?self.timeout, "Kimi CLI timed out");
                return Ok(format!(
                    "Kimi CLI did not finish within {} seconds and was stopped.",
                    self.timeout.as_secs()
                ));
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(format!(
                    "Error: Kimi CLI is not installed. Please install it first:\n  {INSTALL_HINT}\n\n\
                     After installation, the 'kimi' command will be available."
                ));
            }
            Err(err) => return Ok(format!("Error executing Kimi CLI: {err}")),
        };

        if !output.status.success() {
            let code = output
                .status
                .code()
                .map(|code| code.to_string())
                .unwrap_or_else(|| "signal".to_string());
            return Ok(format!(
                "Kimi CLI error (exit code {code}):\n{}\n\n\
                 Note: Kimi CLI may not support fully non-interactive mode. For complex \
                 operations, consider breaking down the task into simpler shell commands or \
                 using other tools.",
                String::from_utf8_lossy(&output.stderr).trim_end()
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            Ok("Kimi CLI executed successfully with no output.".to_string())
        } else {
            Ok(stdout.into_owned())
        }
    }
}
