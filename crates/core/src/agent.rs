mod builder;
mod state;

use std::path::{Path, PathBuf};
use std::time::Duration;

use omo_model::ModelRequest;
use tokio::time::{Instant, timeout};
use tracing::Instrument;

use crate::accumulator::{AccumulatedResponse, Accumulator, Folded, ToolCall};
use crate::conversation::{TOOL_CALL_PLACEHOLDER, Transcript, Turn};
use crate::instructions::{InstructionsContext, InstructionsSource};
use crate::model_client::ModelClient;
use crate::tool::{Registry, ToolContext};
use crate::{AgentEvent, Error};
pub use builder::AgentBuilder;
pub use state::TurnStage;

/// An agent instance, which maintains a conversation, a model client, and
/// the tools the model may call.
///
/// Each [`chat`](Self::chat) call drives one turn: the model is asked
/// for a response, any tools it requests are executed one after another,
/// and the results are fed back until the model answers without
/// requesting tools.
pub struct Agent {
    model_client: ModelClient,
    tools: Registry,
    instructions: Box<dyn InstructionsSource>,
    working_dir: PathBuf,
    on_event: Option<Box<dyn Fn(&AgentEvent) + Send + Sync>>,
    max_rounds: Option<usize>,
    stream_idle_timeout: Option<Duration>,

    transcript: Transcript,
    stage: TurnStage,
    thinking: bool,
}

impl Agent {
    /// Sends a user message and drives the turn until the model replies
    /// without requesting tools.
    ///
    /// Returns the text of the final response. Tool failures don't end the
    /// turn, they are reported back to the model instead.
    ///
    /// # Cancel safety
    ///
    /// Dropping the returned future abandons the turn. Entries appended to
    /// the transcript so far are kept.
    pub async fn chat<S: Into<String>>(
        &mut self,
        message: S,
    ) -> Result<String, Error> {
        self.transcript.push(Turn::user(message));

        let span = debug_span!("chat", turn = self.transcript.len());
        let result = self.run_turn().instrument(span).await;
        if let Err(err) = &result {
            error!("turn failed: {err}");
            self.set_thinking(false);
        }
        self.stage = TurnStage::Idle;
        result
    }

    /// Returns the conversation so far.
    #[inline]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Returns the stage of the current turn.
    #[inline]
    pub fn stage(&self) -> TurnStage {
        self.stage
    }

    /// Returns the directory tools operate in.
    #[inline]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Forgets the conversation.
    #[inline]
    pub fn clear(&mut self) {
        self.transcript = Transcript::default();
    }
}

impl Agent {
    async fn run_turn(&mut self) -> Result<String, Error> {
        let mut round = 0;
        loop {
            round += 1;
            if let Some(max_rounds) = self.max_rounds {
                if round > max_rounds {
                    return Err(Error::RoundLimitExceeded(max_rounds));
                }
            }

            let AccumulatedResponse { text, tool_calls } = self
                .run_round(round)
                .instrument(debug_span!("round", round))
                .await?;

            if tool_calls.is_empty() {
                self.stage = TurnStage::Finalizing;
                self.transcript.push(Turn::assistant(text.clone()));
                self.emit(AgentEvent::ResponseEnd {
                    full_text: text.clone(),
                });
                return Ok(text);
            }

            self.stage = TurnStage::Dispatching;
            debug!("dispatching {} tool calls", tool_calls.len());
            if text.is_empty() {
                self.transcript.push(Turn::assistant(TOOL_CALL_PLACEHOLDER));
            } else {
                self.transcript.push(Turn::assistant(text));
            }
            for call in tool_calls {
                self.dispatch(call).await;
            }
        }
    }

    async fn run_round(
        &mut self,
        round: usize,
    ) -> Result<AccumulatedResponse, Error> {
        self.stage = TurnStage::Requesting;
        self.set_thinking(true);

        let ctx = InstructionsContext {
            working_dir: self.working_dir.clone(),
            round,
            max_rounds: self.max_rounds,
        };
        let instructions = self.instructions.load_instructions(&ctx).await;
        let req = ModelRequest {
            instructions,
            messages: self.transcript.to_messages(),
            tools: self.tools.schemas(),
        };

        let started_at = Instant::now();
        let mut resp = self
            .model_client
            .send_request(req)
            .await
            .map_err(Error::Provider)?;

        self.stage = TurnStage::Streaming;
        let mut accumulator = Accumulator::new();
        loop {
            let event = match self.stream_idle_timeout {
                Some(idle) => timeout(idle, resp.next_event())
                    .await
                    .map_err(|_| Error::StreamStalled(idle))?,
                None => resp.next_event().await,
            };
            let Some(event) = event.map_err(Error::Provider)? else {
                trace!("stream ended");
                break;
            };
            self.set_thinking(false);

            match accumulator.fold(event)? {
                Folded::Text { delta, first } => {
                    if first {
                        debug!("first token after {:?}", started_at.elapsed());
                    }
                    self.emit(AgentEvent::Token { text: delta });
                }
                Folded::ToolCall => {}
                Folded::Completed => break,
            }
        }
        self.set_thinking(false);

        Ok(accumulator.finish())
    }

    async fn dispatch(&mut self, call: ToolCall) {
        let ToolCall {
            id,
            name,
            arguments,
        } = call;
        let ctx = ToolContext::new(self.working_dir.clone());

        let outcome = self
            .tools
            .execute(&name, &arguments, ctx, |args| {
                self.emit(AgentEvent::ToolStart {
                    name: name.clone(),
                    args: args.clone(),
                });
            })
            .instrument(debug_span!("tool call", %id, %name))
            .await;
        if let Err(err) = &outcome {
            warn!("tool call {id} ({name}) failed: {err}");
        }

        let (result, error) = match &outcome {
            Ok(result) => (result.clone(), None),
            Err(err) => (String::new(), Some(err.to_string())),
        };
        self.emit(AgentEvent::ToolEnd {
            name: name.clone(),
            result,
            error,
        });
        self.transcript.push(Turn::tool_outcome(&name, &outcome));
    }

    fn set_thinking(&mut self, thinking: bool) {
        if self.thinking == thinking {
            return;
        }
        self.thinking = thinking;
        self.emit(AgentEvent::Thinking { status: thinking });
    }

    #[inline]
    fn emit(&self, event: AgentEvent) {
        if let Some(on_event) = &self.on_event {
            on_event(&event);
        }
    }
}
