use std::time::Duration;

use omo_model::{ModelResponseEvent, ToolCallOpened};
use serde::{Deserialize, Serialize};

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message_delta")]
    MessageDelta(String),
    #[serde(rename = "tool_call_opened")]
    ToolCallOpened {
        slot: u32,
        call_id: Option<String>,
        name: String,
    },
    #[serde(rename = "arguments_delta")]
    ArgumentsDelta { slot: u32, delta: String },
    #[serde(rename = "error")]
    Error(Option<String>),
}

impl PresetEvent {
    /// A text delta.
    #[inline]
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self::MessageDelta(text.into())
    }

    /// A function call announced at `slot`, without a call id.
    #[inline]
    pub fn tool_call<S: Into<String>>(slot: u32, name: S) -> Self {
        Self::ToolCallOpened {
            slot,
            call_id: None,
            name: name.into(),
        }
    }

    /// An argument fragment for the call at `slot`.
    #[inline]
    pub fn arguments<S: Into<String>>(slot: u32, delta: S) -> Self {
        Self::ArgumentsDelta {
            slot,
            delta: delta.into(),
        }
    }

    pub(crate) fn to_event(&self) -> ModelResponseEvent {
        match self {
            PresetEvent::MessageDelta(delta) => {
                ModelResponseEvent::MessageDelta {
                    delta: delta.clone(),
                }
            }
            PresetEvent::ToolCallOpened {
                slot,
                call_id,
                name,
            } => ModelResponseEvent::ToolCallOpened(ToolCallOpened {
                slot: *slot,
                call_id: call_id.clone(),
                item_id: None,
                name: name.clone(),
            }),
            PresetEvent::ArgumentsDelta { slot, delta } => {
                ModelResponseEvent::ToolCallArgumentsDelta {
                    slot: *slot,
                    delta: delta.clone(),
                }
            }
            PresetEvent::Error(message) => ModelResponseEvent::Error {
                message: message.clone(),
            },
        }
    }
}

/// The preset response for one round.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// Whether a completion record follows the events.
    pub completed: bool,
    /// If set, the request will fail in the first `failure` attempts.
    /// `Some(0)` means the request will fail infinitely.
    pub failures: Option<u64>,
    /// Delay before each event, overriding the provider-wide delay.
    pub event_delay: Option<Duration>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events, followed by a
    /// completion record.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            completed: true,
            failures: None,
            event_delay: None,
        }
    }

    /// Ends the stream after the events without a completion record.
    #[inline]
    pub fn without_completion(mut self) -> Self {
        self.completed = false;
        self
    }

    /// Sets failure times before a successful response. `0` means the
    /// response will always be a failure.
    #[inline]
    pub fn with_failures(mut self, failures: u64) -> Self {
        self.failures = Some(failures);
        self
    }

    /// Sets the delay before each event of this response.
    #[inline]
    pub fn with_event_delay(mut self, delay: Duration) -> Self {
        self.event_delay = Some(delay);
        self
    }
}
