use omo_core::tool::{Error as ToolError, Tool, ToolContext, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;
use tokio::fs;

/// Input of [`EditTool`].
#[derive(Deserialize, JsonSchema)]
pub struct EditToolParameters {
    #[schemars(description = "File path")]
    path: String,
    #[schemars(description = "Text to find")]
    search: String,
    #[schemars(description = "Replacement text")]
    replace: String,
}

/// A tool for replacing the first exact occurrence of a text in a file.
pub struct EditTool {
    parameter_schema: Value,
}

impl EditTool {
    /// Creates a new edit tool.
    #[inline]
    pub fn new() -> Self {
        EditTool {
            parameter_schema: schema_for!(EditToolParameters).to_value(),
        }
    }
}

impl Default for EditTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for EditTool {
    type Input = EditToolParameters;

    fn name(&self) -> &str {
        "edit"
    }

    fn description(&self) -> &str {
        "Edit a file by finding and replacing text exactly."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: EditToolParameters,
        ctx: ToolContext,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        async move {
            let path = ctx.resolve(&input.path);
            let to_tool_error = |err: std::io::Error| {
                ToolError::execution_error()
                    .with_reason(format!("{}: {err}", path.display()))
            };

            let content =
                fs::read_to_string(&path).await.map_err(to_tool_error)?;
            if !content.contains(&input.search) {
                return Ok(format!(
                    "Error: Text not found in {}",
                    path.display()
                ));
            }

            let edited = content.replacen(&input.search, &input.replace, 1);
            fs::write(&path, edited).await.map_err(to_tool_error)?;
            Ok(format!("Edited {}", path.display()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(path: &str, search: &str, replace: &str) -> EditToolParameters {
        EditToolParameters {
            path: path.to_owned(),
            search: search.to_owned(),
            replace: replace.to_owned(),
        }
    }

    #[tokio::test]
    async fn test_replaces_first_occurrence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib.rs");
        std::fs::write(&path, "let a = 1;\nlet a = 1;\n").unwrap();

        let result = EditTool::new()
            .execute(
                edit("lib.rs", "a = 1", "b = 2"),
                ToolContext::new(dir.path()),
            )
            .await;
        assert_eq!(result.unwrap(), format!("Edited {}", path.display()));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "let b = 2;\nlet a = 1;\n"
        );
    }

    #[tokio::test]
    async fn test_text_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib.rs");
        std::fs::write(&path, "fn main() {}\n").unwrap();

        let result = EditTool::new()
            .execute(
                edit("lib.rs", "fn other", "fn renamed"),
                ToolContext::new(dir.path()),
            )
            .await;
        assert_eq!(
            result.unwrap(),
            format!("Error: Text not found in {}", path.display())
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fn main() {}\n");
    }

    #[tokio::test]
    async fn test_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = EditTool::new()
            .execute(edit("nope.rs", "a", "b"), ToolContext::new(dir.path()))
            .await;
        assert!(result.unwrap_err().reason().contains("nope.rs"));
    }
}
