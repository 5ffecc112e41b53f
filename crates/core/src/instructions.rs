//! Sources of the instructions sent along with every request.
//!
//! The agent asks its [`InstructionsSource`] for a fresh string at the top
//! of every round, so a source may return different text as the
//! conversation goes on.

mod memory;
mod storage;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

pub use memory::{DAILY_LOG_DIR, LONG_TERM_MEMORY_FILE, MemoryInstructions};
pub use storage::{FsStorage, Storage};

/// The instructions used when nothing else is available.
pub const DEFAULT_INSTRUCTIONS: &str =
    "You are OMO, a helpful AI coding assistant.";

/// What the agent knows about the round being prepared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstructionsContext {
    /// The working directory of the agent.
    pub working_dir: PathBuf,
    /// The 1-based round number within the current `chat` call.
    pub round: usize,
    /// The round cap, if one is configured.
    pub max_rounds: Option<usize>,
}

impl InstructionsContext {
    /// Returns `true` if this is the last round allowed by the cap.
    #[inline]
    pub fn is_last_round(&self) -> bool {
        self.max_rounds.is_some_and(|max| self.round >= max)
    }

    /// Returns the working directory of the agent.
    #[inline]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }
}

/// A type that produces the instructions for each round.
///
/// Loading must not fail: sources are expected to degrade to something
/// sensible instead.
#[async_trait]
pub trait InstructionsSource: Send + Sync {
    /// Returns the instructions for the round described by `ctx`.
    async fn load_instructions(&self, ctx: &InstructionsContext) -> String;
}

#[async_trait]
impl<S: InstructionsSource + ?Sized> InstructionsSource for Box<S> {
    async fn load_instructions(&self, ctx: &InstructionsContext) -> String {
        (**self).load_instructions(ctx).await
    }
}

/// Fixed instructions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticInstructions(String);

impl StaticInstructions {
    /// Creates a source that always returns `instructions`.
    #[inline]
    pub fn new<S: Into<String>>(instructions: S) -> Self {
        Self(instructions.into())
    }
}

impl Default for StaticInstructions {
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_INSTRUCTIONS)
    }
}

#[async_trait]
impl InstructionsSource for StaticInstructions {
    async fn load_instructions(&self, _ctx: &InstructionsContext) -> String {
        self.0.clone()
    }
}

/// Appends a directive asking for a final answer on the last round.
///
/// Without a round cap this is transparent.
#[derive(Clone, Debug)]
pub struct FinalReplyDirective<S> {
    inner: S,
    directive: String,
}

impl<S: InstructionsSource> FinalReplyDirective<S> {
    /// Wraps `inner` with the default directive.
    #[inline]
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            directive: "This is your last step. Do not call any more tools, \
                reply to the user with what you have."
                .to_owned(),
        }
    }

    /// Replaces the directive text.
    #[inline]
    pub fn with_directive<D: Into<String>>(mut self, directive: D) -> Self {
        self.directive = directive.into();
        self
    }
}

#[async_trait]
impl<S: InstructionsSource> InstructionsSource for FinalReplyDirective<S> {
    async fn load_instructions(&self, ctx: &InstructionsContext) -> String {
        let mut instructions = self.inner.load_instructions(ctx).await;
        if ctx.is_last_round() {
            debug!("round {} is the last one", ctx.round);
            if !instructions.is_empty() {
                instructions.push_str("\n\n");
            }
            instructions.push_str(&self.directive);
        }
        instructions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(round: usize, max_rounds: Option<usize>) -> InstructionsContext {
        InstructionsContext {
            working_dir: PathBuf::from("/work"),
            round,
            max_rounds,
        }
    }

    #[tokio::test]
    async fn test_static_instructions() {
        let source = StaticInstructions::default();
        assert_eq!(
            source.load_instructions(&context(1, None)).await,
            DEFAULT_INSTRUCTIONS
        );
    }

    #[tokio::test]
    async fn test_final_reply_directive() {
        let source = FinalReplyDirective::new(StaticInstructions::new("Base."))
            .with_directive("Wrap up.");

        assert_eq!(source.load_instructions(&context(1, None)).await, "Base.");
        assert_eq!(
            source.load_instructions(&context(2, Some(3))).await,
            "Base."
        );
        assert_eq!(
            source.load_instructions(&context(3, Some(3))).await,
            "Base.\n\nWrap up."
        );
    }
}
