use std::pin::Pin;
use std::task::{Context, Poll, ready};

use futures_util::future::BoxFuture;
use omo_model::{ErrorKind, ModelResponse, ModelResponseEvent};
use pin_project_lite::pin_project;

use crate::Error;
use crate::io::{Sse, SseError};
use crate::proto;

struct StreamState {
    sse: Sse,
    // Set once the completion record has been delivered. Nothing after it is
    // read from the stream.
    completed: bool,
}

type NextEvent = Result<(Option<ModelResponseEvent>, StreamState), Error>;

pin_project! {
    pub struct ResponsesResponse {
        next_event_fut: Option<BoxFuture<'static, NextEvent>>,
    }
}

impl ResponsesResponse {
    #[inline]
    pub fn from_sse(sse: Sse) -> Self {
        let state = StreamState {
            sse,
            completed: false,
        };
        Self {
            next_event_fut: Some(Box::pin(next_event(state))),
        }
    }
}

impl ModelResponse for ResponsesResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        let (event, state) = match ready!(next_event_fut.as_mut().poll(cx)) {
            Ok((Some(event), state)) => (event, state),
            Ok((None, _)) => {
                *this.next_event_fut = None;
                return Poll::Ready(Ok(None));
            }
            Err(err) => {
                *this.next_event_fut = None;
                return Poll::Ready(Err(err));
            }
        };

        // The stream may still have more data to pull, create a new future for
        // the next event.
        *this.next_event_fut = Some(Box::pin(next_event(state)));

        Poll::Ready(Ok(Some(event)))
    }
}

async fn next_event(mut state: StreamState) -> NextEvent {
    if state.completed {
        return Ok((None, state));
    }

    loop {
        let record = match state.sse.next_record().await {
            Ok(Some(record)) => record,
            Ok(None) => return Ok((None, state)),
            Err(SseError::ChunksError(err)) => {
                return Err(Error::new(
                    format!("Stream interrupted: {}", err.0),
                    ErrorKind::Other,
                ));
            }
        };
        trace!("got sse record: {record}");

        let event = proto::decode_record(record).map_err(|err| {
            Error::new(
                format!("Malformed stream record: {err}"),
                ErrorKind::Other,
            )
        })?;
        let Some(event) = event else {
            continue;
        };
        if event == ModelResponseEvent::Completed {
            state.completed = true;
        }
        return Ok((Some(event), state));
    }
}
