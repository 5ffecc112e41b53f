use std::io::ErrorKind;

use omo_core::tool::{Error as ToolError, Tool, ToolContext, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;
use tokio::fs;

/// Input of [`ReadTool`].
#[derive(Deserialize, JsonSchema)]
pub struct ReadToolParameters {
    #[schemars(description = "The file path to read")]
    path: String,
}

/// A tool for reading the whole content of a file.
pub struct ReadTool {
    parameter_schema: Value,
}

impl ReadTool {
    /// Creates a new read tool.
    #[inline]
    pub fn new() -> Self {
        ReadTool {
            parameter_schema: schema_for!(ReadToolParameters).to_value(),
        }
    }
}

impl Default for ReadTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for ReadTool {
    type Input = ReadToolParameters;

    fn name(&self) -> &str {
        "read"
    }

    fn description(&self) -> &str {
        "Read the contents of a file at the specified path."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: ReadToolParameters,
        ctx: ToolContext,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        async move {
            let path = ctx.resolve(&input.path);
            match fs::read_to_string(&path).await {
                Ok(content) => Ok(content),
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    Ok(format!("Error: File not found: {}", path.display()))
                }
                Err(err) => Err(ToolError::execution_error()
                    .with_reason(format!("{}: {err}", path.display()))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/main.rs"), "fn main() {}\n")
            .unwrap();

        let tool = ReadTool::new();
        let input = serde_json::from_value(serde_json::json!({
            "path": "src/main.rs"
        }))
        .unwrap();
        let result = tool.execute(input, ToolContext::new(dir.path())).await;
        assert_eq!(result.unwrap(), "fn main() {}\n");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ReadTool::new();
        let input = ReadToolParameters {
            path: "nope.txt".to_owned(),
        };
        let result = tool.execute(input, ToolContext::new(dir.path())).await;
        assert_eq!(
            result.unwrap(),
            format!("Error: File not found: {}", dir.path().join("nope.txt").display())
        );
    }

    #[tokio::test]
    async fn test_read_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ReadTool::new();
        let input = ReadToolParameters {
            path: dir.path().display().to_string(),
        };
        let result = tool.execute(input, ToolContext::new("/")).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_schema() {
        let schema = ReadTool::new().parameter_schema().clone();
        assert_eq!(schema["properties"]["path"]["type"], "string");
        assert_eq!(schema["required"], serde_json::json!(["path"]));
    }
}
