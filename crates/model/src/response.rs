use std::pin::Pin;
use std::task::{self, Poll};

use serde::{Deserialize, Serialize};

use crate::provider::ModelProviderError;

/// A response from the model provider.
pub trait ModelResponse: Sized + Send + 'static {
    /// The error type that may be returned by the provider.
    type Error: ModelProviderError;

    /// Attempts to pull out the next record from the response.
    ///
    /// # Return value
    ///
    /// There are several possible return values, each indicating a
    /// distinct response state:
    ///
    /// - `Poll::Pending` means that this response is still waiting for
    ///   the next record. Implementations will ensure that the current
    ///   task will be notified when the next record may be ready.
    /// - `Poll::Ready(Ok(Some(event)))` means the response has a record
    ///   to deliver, and may produce further records on subsequent
    ///   `poll_next_event` calls.
    /// - `Poll::Ready(Ok(None))` means the underlying stream has ended.
    /// - `Poll::Ready(Err(error))` means a transport error occurred while
    ///   reading the response.
    ///
    /// Calling this method after completion should always return `None`.
    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>>;
}

/// A record announcing a new function-call output item.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolCallOpened {
    /// The position of the output item within the response.
    pub slot: u32,
    /// The call id assigned by the server, if any.
    pub call_id: Option<String>,
    /// The generic item id, if any.
    pub item_id: Option<String>,
    /// The name of the tool to call.
    pub name: String,
}

/// A record from a model response.
///
/// Records are ephemeral: they are consumed one by one and never
/// persisted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelResponseEvent {
    /// Received an assistant text delta.
    MessageDelta {
        /// The text fragment.
        delta: String,
    },
    /// A function call has been announced at a slot.
    ToolCallOpened(ToolCallOpened),
    /// Received an argument fragment for the call at a slot.
    ToolCallArgumentsDelta {
        /// The position of the output item within the response.
        slot: u32,
        /// The argument fragment.
        delta: String,
    },
    /// The response has been completed.
    Completed,
    /// The endpoint reported an error inside the stream.
    Error {
        /// The message reported by the endpoint, if any.
        message: Option<String>,
    },
}
