use std::path::PathBuf;
use std::time::Duration;

use omo_core::conversation::Transcript;
use omo_core::instructions::{
    FinalReplyDirective, FsStorage, InstructionsSource, MemoryInstructions,
};
use omo_core::{Agent, AgentBuilder, AgentEvent, Error};
use omo_model::ModelProvider;

use crate::tools::*;

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    agent_builder: AgentBuilder,
    home_dir: Option<PathBuf>,
    instructions: Option<Box<dyn InstructionsSource>>,
}

impl SessionBuilder {
    /// Creates a session builder with a specified model provider.
    pub fn with_model_provider<M: ModelProvider + 'static>(
        provider: M,
    ) -> Self {
        let agent_builder = AgentBuilder::with_model_provider(provider);
        Self {
            agent_builder,
            home_dir: None,
            instructions: None,
        }
    }

    /// Sets the directory the tools operate in.
    #[inline]
    pub fn with_working_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.agent_builder = self.agent_builder.with_working_dir(dir);
        self
    }

    /// Sets the directory holding identity and memory documents.
    ///
    /// Defaults to the current directory of the process.
    #[inline]
    pub fn with_home_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.home_dir = Some(dir.into());
        self
    }

    /// Replaces the memory-backed instructions.
    #[inline]
    pub fn with_instructions<S: InstructionsSource + 'static>(
        mut self,
        source: S,
    ) -> Self {
        self.instructions = Some(Box::new(source));
        self
    }

    /// Attaches a callback to be invoked for every [`AgentEvent`].
    #[inline]
    pub fn on_event(
        mut self,
        on_event: impl Fn(&AgentEvent) + Send + Sync + 'static,
    ) -> Self {
        self.agent_builder = self.agent_builder.on_event(on_event);
        self
    }

    /// Caps the number of model requests per message.
    #[inline]
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.agent_builder = self.agent_builder.with_max_rounds(max_rounds);
        self
    }

    /// Fails a message when the model stays silent for `timeout`.
    #[inline]
    pub fn with_stream_idle_timeout(mut self, timeout: Duration) -> Self {
        self.agent_builder =
            self.agent_builder.with_stream_idle_timeout(timeout);
        self
    }

    /// Builds a new session.
    pub fn build(self) -> Session {
        let mut agent_builder = self
            .agent_builder
            .with_tool(BashTool::new())
            .with_tool(ReadTool::new())
            .with_tool(WriteTool::new())
            .with_tool(EditTool::new());

        agent_builder = match self.instructions {
            Some(instructions) => agent_builder.with_instructions(instructions),
            None => {
                let home_dir = self
                    .home_dir
                    .unwrap_or_else(|| PathBuf::from("."));
                let memory = MemoryInstructions::new(FsStorage::new(home_dir));
                agent_builder.with_instructions(FinalReplyDirective::new(memory))
            }
        };

        Session {
            agent: agent_builder.build(),
        }
    }
}

/// A chat session, like a window that displays messages and has a input box.
///
/// The session holds an agent equipped with the built-in coding tools and
/// memory-backed instructions, and it is basically a wrapper around
/// [`Agent`].
pub struct Session {
    agent: Agent,
}

impl Session {
    /// Sends a message and waits for the final reply.
    #[inline]
    pub async fn send_message(&mut self, message: &str) -> Result<String, Error> {
        self.agent.chat(message).await
    }

    /// Starts over with an empty conversation.
    #[inline]
    pub fn clear(&mut self) {
        self.agent.clear();
    }

    /// Returns the conversation so far.
    #[inline]
    pub fn transcript(&self) -> &Transcript {
        self.agent.transcript()
    }

    /// Returns the underlying agent.
    #[inline]
    pub fn agent(&self) -> &Agent {
        &self.agent
    }
}
