use std::sync::Arc;

use omo_model::ModelTool;
use serde_json::{Map, Value};

use crate::tool::object::{ToolObject, ToolObjectImpl};
use crate::tool::{Error, Tool, ToolContext, ToolResult};

/// The set of tools available to the model, and the gateway every tool
/// call goes through.
#[derive(Clone, Default)]
pub struct Registry {
    tools: Vec<Arc<dyn ToolObject>>,
}

impl Registry {
    /// Registers a tool.
    ///
    /// A tool registered under an existing name replaces the old one, but
    /// keeps its position in [`schemas`](Self::schemas).
    pub fn add_tool<T: Tool>(&mut self, tool: T) {
        let tool: Arc<dyn ToolObject> = Arc::new(ToolObjectImpl(tool));
        match self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            Some(existing) => {
                warn!("replacing tool: {}", tool.name());
                *existing = tool;
            }
            None => self.tools.push(tool),
        }
    }

    /// Returns the number of registered tools.
    #[inline]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` if no tool is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Returns the schemas of all tools, in registration order.
    pub fn schemas(&self) -> Vec<ModelTool> {
        self.tools
            .iter()
            .map(|tool| ModelTool {
                name: tool.name().to_owned(),
                description: tool.description().to_owned(),
                parameters: tool.parameter_schema().clone(),
            })
            .collect()
    }

    /// Parses a raw argument string.
    ///
    /// An empty (or blank) string stands for an empty object.
    fn parse_arguments(raw: &str) -> Result<Value, Error> {
        if raw.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        serde_json::from_str(raw).map_err(|err| {
            Error::invalid_input()
                .with_reason(format!("Failed to parse arguments: {err}"))
        })
    }

    /// Invokes the tool named `name` with already parsed arguments.
    ///
    /// Calling a tool that doesn't exist is not an error: the model is told
    /// so through the result text.
    async fn invoke(
        &self,
        name: &str,
        arguments: Value,
        ctx: ToolContext,
    ) -> ToolResult {
        let Some(tool) = self.tools.iter().find(|t| t.name() == name) else {
            warn!("tool not found: {name}");
            return Ok(format!("Error: Unknown tool \"{name}\""));
        };

        trace!("invoking tool {name} with args: {arguments}");
        let fut = tool.execute(arguments, ctx);
        fut.await
    }

    /// Parses `raw_arguments` and invokes the tool named `name`.
    ///
    /// `on_start` sees the parsed arguments right before the tool runs. It
    /// is not called when the arguments can't be parsed.
    pub async fn execute<F>(
        &self,
        name: &str,
        raw_arguments: &str,
        ctx: ToolContext,
        on_start: F,
    ) -> ToolResult
    where
        F: FnOnce(&Value),
    {
        let arguments = Self::parse_arguments(raw_arguments)?;
        on_start(&arguments);
        self.invoke(name, arguments, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use std::future::ready;
    use std::sync::LazyLock;

    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::tool::ErrorKind;

    static EMPTY_SCHEMA: &Value = &Value::Null;
    static ECHO_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
        json!({
            "type": "object",
            "properties": { "text": { "type": "string" } },
            "required": ["text"]
        })
    });

    #[derive(Deserialize)]
    struct EchoInput {
        text: String,
    }

    struct EchoTool;

    impl Tool for EchoTool {
        type Input = EchoInput;

        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes the text back"
        }

        fn parameter_schema(&self) -> &Value {
            &ECHO_SCHEMA
        }

        fn execute(
            &self,
            input: Self::Input,
            ctx: ToolContext,
        ) -> impl Future<Output = ToolResult> + Send + 'static {
            ready(Ok(format!(
                "{} (in {})",
                input.text,
                ctx.working_dir().display()
            )))
        }
    }

    struct PwdTool;

    impl Tool for PwdTool {
        type Input = Value;

        fn name(&self) -> &str {
            "pwd"
        }

        fn description(&self) -> &str {
            "Prints the working directory"
        }

        fn parameter_schema(&self) -> &Value {
            EMPTY_SCHEMA
        }

        fn execute(
            &self,
            _input: Self::Input,
            _ctx: ToolContext,
        ) -> impl Future<Output = ToolResult> + Send + 'static {
            ready(Err(Error::execution_error().with_reason("not here")))
        }
    }

    fn registry() -> Registry {
        let mut registry = Registry::default();
        registry.add_tool(EchoTool);
        registry.add_tool(PwdTool);
        registry
    }

    #[test]
    fn test_schemas_in_registration_order() {
        let schemas = registry().schemas();
        let names: Vec<_> = schemas.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["echo", "pwd"]);
        assert_eq!(schemas[0].parameters, *ECHO_SCHEMA);
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!(Registry::parse_arguments("").unwrap(), json!({}));
        assert_eq!(
            Registry::parse_arguments(r#"{"a":1}"#).unwrap(),
            json!({ "a": 1 })
        );
        let err = Registry::parse_arguments(r#"{"a":"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_execute() {
        let registry = registry();
        let ctx = ToolContext::new("/work");

        let result = registry
            .execute("echo", r#"{"text":"hi"}"#, ctx.clone(), |_| {})
            .await;
        assert_eq!(result.unwrap(), "hi (in /work)");

        let result = registry.execute("pwd", "", ctx.clone(), |_| {}).await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Execution error: not here"
        );

        // Arguments that don't fit the input type.
        let result = registry
            .execute("echo", r#"{"txt":1}"#, ctx.clone(), |_| {})
            .await;
        assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_on_start_sees_parsed_arguments() {
        let mut started = None;
        let result = registry()
            .execute("echo", r#"{"text":"hi"}"#, ToolContext::new("/"), |args| {
                started = Some(args.clone());
            })
            .await;
        assert!(result.is_ok());
        assert_eq!(started, Some(json!({ "text": "hi" })));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let result = registry()
            .execute("grep", "{}", ToolContext::new("/work"), |_| {})
            .await;
        assert_eq!(result.unwrap(), "Error: Unknown tool \"grep\"");
    }

    #[tokio::test]
    async fn test_parse_failure_before_lookup() {
        let mut started = false;
        let result = registry()
            .execute("grep", "not json", ToolContext::new("/work"), |_| {
                started = true;
            })
            .await;
        assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidInput);
        assert!(!started);
    }
}
