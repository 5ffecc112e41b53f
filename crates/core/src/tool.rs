//! Tool call supports.

mod error;
mod object;
mod registry;

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::Value;

pub use error::{Error, ErrorKind};
pub use registry::Registry;

/// The result of a tool call.
pub type ToolResult = Result<String, Error>;

/// Execution context handed to every tool call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolContext {
    working_dir: PathBuf,
}

impl ToolContext {
    /// Creates a context rooted at `working_dir`.
    #[inline]
    pub fn new<P: Into<PathBuf>>(working_dir: P) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    /// Returns the working directory of the agent.
    #[inline]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Resolves a path given by the model against the working directory.
    ///
    /// Absolute paths are returned as is.
    #[inline]
    pub fn resolve<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.working_dir.join(path)
    }
}

/// A tool that can be called by the model.
///
/// Implementations of this trait should be stateless, and may not maintain any
/// internal state. Anything that depends on where the agent runs is taken
/// from the [`ToolContext`] passed to each call.
pub trait Tool: Send + Sync + 'static {
    /// The type of input that the tool accepts.
    type Input: DeserializeOwned;

    /// Returns the name of the tool.
    fn name(&self) -> &str;

    /// Returns the description of the tool.
    fn description(&self) -> &str;

    /// Returns the parameter schema of the tool.
    fn parameter_schema(&self) -> &Value;

    /// Executes the tool with the given input.
    ///
    /// This method must return a future that is fully independent of `self`.
    /// Failures are reported through the returned [`ToolResult`], never by
    /// panicking.
    fn execute(
        &self,
        input: Self::Input,
        ctx: ToolContext,
    ) -> impl Future<Output = ToolResult> + Send + 'static;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        let ctx = ToolContext::new("/work");
        assert_eq!(ctx.resolve("a/b.txt"), PathBuf::from("/work/a/b.txt"));
        assert_eq!(ctx.resolve("/etc/hosts"), PathBuf::from("/etc/hosts"));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(Error::invalid_input().to_string(), "Invalid input");
        let err = Error::execution_error().with_reason("exit status 1");
        assert_eq!(err.kind(), ErrorKind::ExecutionError);
        assert_eq!(err.to_string(), "Execution error: exit status 1");
        assert_eq!(err.reason(), "exit status 1");
    }
}
