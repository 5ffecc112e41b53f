use omo_core::tool::{Error as ToolError, Tool, ToolContext, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;
use tokio::fs;

/// Input of [`WriteTool`].
#[derive(Deserialize, JsonSchema)]
pub struct WriteToolParameters {
    #[schemars(description = "File path to write")]
    path: String,
    #[schemars(description = "Content to write")]
    content: String,
}

/// A tool for writing a whole file, creating parent directories if needed.
pub struct WriteTool {
    parameter_schema: Value,
}

impl WriteTool {
    /// Creates a new write tool.
    #[inline]
    pub fn new() -> Self {
        WriteTool {
            parameter_schema: schema_for!(WriteToolParameters).to_value(),
        }
    }
}

impl Default for WriteTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for WriteTool {
    type Input = WriteToolParameters;

    fn name(&self) -> &str {
        "write"
    }

    fn description(&self) -> &str {
        "Write content to a file. Creates parent directories if needed."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: WriteToolParameters,
        ctx: ToolContext,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        async move {
            let path = ctx.resolve(&input.path);
            let to_tool_error = |err: std::io::Error| {
                ToolError::execution_error()
                    .with_reason(format!("{}: {err}", path.display()))
            };

            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await.map_err(to_tool_error)?;
            }
            fs::write(&path, &input.content)
                .await
                .map_err(to_tool_error)?;
            Ok(format!(
                "Wrote {} bytes to {}",
                input.content.len(),
                path.display()
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let tool = WriteTool::new();
        let input = WriteToolParameters {
            path: "notes/today/todo.md".to_owned(),
            content: "- [ ] ship\n".to_owned(),
        };
        let result = tool.execute(input, ToolContext::new(dir.path())).await;

        let path = dir.path().join("notes/today/todo.md");
        assert_eq!(
            result.unwrap(),
            format!("Wrote 11 bytes to {}", path.display())
        );
        assert_eq!(std::fs::read_to_string(path).unwrap(), "- [ ] ship\n");
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "old content").unwrap();

        let input = WriteToolParameters {
            path: path.display().to_string(),
            content: "new".to_owned(),
        };
        WriteTool::new()
            .execute(input, ToolContext::new("/"))
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "new");
    }
}
