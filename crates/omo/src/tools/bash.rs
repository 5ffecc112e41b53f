use std::path::Path;
use std::process::Output;
use std::time::Duration;

use omo_core::tool::{Tool, ToolContext, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;
use tokio::process::Command;
use tokio::time::timeout;

const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Input of [`BashTool`].
#[derive(Deserialize, JsonSchema)]
pub struct BashToolParameters {
    #[schemars(description = "The bash command to execute")]
    command: String,
}

/// A tool for running bash commands in the working directory.
///
/// Commands that fail, or run longer than 30 seconds, are reported to the
/// model through the result text.
pub struct BashTool {
    parameter_schema: Value,
}

impl BashTool {
    /// Creates a new bash tool.
    #[inline]
    pub fn new() -> Self {
        BashTool {
            parameter_schema: schema_for!(BashToolParameters).to_value(),
        }
    }
}

impl Default for BashTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for BashTool {
    type Input = BashToolParameters;

    fn name(&self) -> &str {
        "bash"
    }

    fn description(&self) -> &str {
        "Execute a bash command and return the output."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: BashToolParameters,
        ctx: ToolContext,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        async move {
            Ok(run_command(&input.command, ctx.working_dir(), COMMAND_TIMEOUT)
                .await)
        }
    }
}

async fn run_command(command: &str, cwd: &Path, limit: Duration) -> String {
    debug!("running `{command}` in {}", cwd.display());
    let output = Command::new("bash")
        .arg("-c")
        .arg(command)
        .current_dir(cwd)
        .kill_on_drop(true)
        .output();

    match timeout(limit, output).await {
        Ok(Ok(output)) => format_output(command, &output),
        Ok(Err(err)) => format!("Error: {err}"),
        Err(_) => format!("Error: Command timed out after {limit:?}"),
    }
}

fn format_output(command: &str, output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !output.status.success() {
        let mut result =
            format!("Error: Command failed ({}): {command}", output.status);
        if !stderr.is_empty() {
            result.push('\n');
            result.push_str(&stderr);
        }
        return result;
    }

    let mut result = stdout.into_owned();
    if !stderr.is_empty() {
        result.push_str("\nstderr: ");
        result.push_str(&stderr);
    }
    if result.is_empty() {
        result.push_str("(no output)");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_command() {
        let dir = tempfile::tempdir().unwrap();
        let result =
            run_command("echo 'Hello, World!'", dir.path(), COMMAND_TIMEOUT)
                .await;
        assert_eq!(result, "Hello, World!\n");
    }

    #[tokio::test]
    async fn test_runs_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "").unwrap();
        let result = run_command("ls", dir.path(), COMMAND_TIMEOUT).await;
        assert_eq!(result, "marker.txt\n");
    }

    #[tokio::test]
    async fn test_stderr_and_empty_output() {
        let dir = tempfile::tempdir().unwrap();
        let result =
            run_command("echo out; echo err >&2", dir.path(), COMMAND_TIMEOUT)
                .await;
        assert_eq!(result, "out\n\nstderr: err\n");

        let result = run_command("true", dir.path(), COMMAND_TIMEOUT).await;
        assert_eq!(result, "(no output)");
    }

    #[tokio::test]
    async fn test_failed_command() {
        let dir = tempfile::tempdir().unwrap();
        let result =
            run_command("echo nope >&2; exit 3", dir.path(), COMMAND_TIMEOUT)
                .await;
        assert!(result.starts_with("Error: Command failed ("), "{result}");
        assert!(result.ends_with("\nnope\n"), "{result}");
    }

    #[tokio::test]
    async fn test_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let result =
            run_command("sleep 5", dir.path(), Duration::from_millis(100))
                .await;
        assert_eq!(result, "Error: Command timed out after 100ms");
    }
}
