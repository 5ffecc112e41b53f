use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::time::Duration;

use omo_model::{ErrorKind, ModelProviderError};

/// A failure that terminates a [`chat`](crate::Agent::chat) call.
///
/// Failures of individual tool calls are never reported through this type,
/// they are recorded in the transcript instead.
#[derive(Debug)]
pub enum Error {
    /// The request could not be sent, or the response stream broke.
    Provider(Box<dyn ModelProviderError>),
    /// The endpoint reported an error inside the response stream.
    Protocol(String),
    /// The model was still requesting tools when the round cap was reached.
    RoundLimitExceeded(usize),
    /// No record arrived from the stream within the idle timeout.
    StreamStalled(Duration),
}

impl Error {
    /// Returns the provider error kind, if this is a provider error.
    #[inline]
    pub fn provider_kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Provider(err) => Some(err.kind()),
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Provider(err) => write!(f, "{err}"),
            Error::Protocol(message) => write!(f, "{message}"),
            Error::RoundLimitExceeded(rounds) => {
                write!(f, "Model still requested tools after {rounds} rounds")
            }
            Error::StreamStalled(timeout) => {
                write!(f, "No data received from the model for {timeout:?}")
            }
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Provider(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}
