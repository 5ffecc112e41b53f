use std::path::PathBuf;
use std::time::Duration;

use omo_model::ModelProvider;

use super::Agent;
use crate::AgentEvent;
use crate::instructions::{InstructionsSource, StaticInstructions};
use crate::model_client::ModelClient;
use crate::tool::{Registry, Tool};

/// [`Agent`] builder.
pub struct AgentBuilder {
    pub(crate) model_client: ModelClient,
    pub(crate) tools: Registry,
    pub(crate) instructions: Option<Box<dyn InstructionsSource>>,
    pub(crate) working_dir: Option<PathBuf>,
    pub(crate) on_event: Option<Box<dyn Fn(&AgentEvent) + Send + Sync>>,
    pub(crate) max_rounds: Option<usize>,
    pub(crate) stream_idle_timeout: Option<Duration>,
}

impl AgentBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            tools: Registry::default(),
            instructions: None,
            working_dir: None,
            on_event: None,
            max_rounds: None,
            stream_idle_timeout: None,
        }
    }

    /// Registers a tool.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.tools.add_tool(tool);
        self
    }

    /// Sets the source of the per-round instructions.
    ///
    /// Defaults to [`StaticInstructions::default`].
    #[inline]
    pub fn with_instructions<S: InstructionsSource + 'static>(
        mut self,
        source: S,
    ) -> Self {
        self.instructions = Some(Box::new(source));
        self
    }

    /// Sets the directory tools operate in.
    ///
    /// Defaults to the current directory of the process.
    #[inline]
    pub fn with_working_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Attaches a callback to be invoked for every [`AgentEvent`].
    #[inline]
    pub fn on_event(
        mut self,
        on_event: impl Fn(&AgentEvent) + Send + Sync + 'static,
    ) -> Self {
        self.on_event = Some(Box::new(on_event));
        self
    }

    /// Caps the number of model requests a single `chat` call may make.
    #[inline]
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = Some(max_rounds);
        self
    }

    /// Fails a round when no record arrives within `timeout`.
    #[inline]
    pub fn with_stream_idle_timeout(mut self, timeout: Duration) -> Self {
        self.stream_idle_timeout = Some(timeout);
        self
    }

    /// Builds the agent.
    pub fn build(self) -> Agent {
        let working_dir = match self.working_dir {
            Some(dir) => dir,
            None => std::env::current_dir().unwrap_or_else(|err| {
                warn!("failed to get the current directory: {err}");
                PathBuf::from(".")
            }),
        };
        let instructions = self
            .instructions
            .unwrap_or_else(|| Box::new(StaticInstructions::default()));

        Agent {
            model_client: self.model_client,
            tools: self.tools,
            instructions,
            working_dir,
            on_event: self.on_event,
            max_rounds: self.max_rounds,
            stream_idle_timeout: self.stream_idle_timeout,
            transcript: Default::default(),
            stage: Default::default(),
            thinking: false,
        }
    }
}
