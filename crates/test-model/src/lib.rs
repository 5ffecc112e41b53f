//! A local fake model for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use omo_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest, ModelResponse,
    ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    events: VecDeque<ModelResponseEvent>,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();
        if this.events.is_empty() {
            return Poll::Ready(Ok(None));
        }

        let delay = this.delay;
        let timer = this.sleep.get_or_insert_with(|| Box::pin(sleep(delay)));
        ready!(timer.as_mut().poll(cx));
        this.sleep = None;

        Poll::Ready(Ok(this.events.pop_front()))
    }
}

#[derive(Default)]
struct Script {
    responses: VecDeque<PresetResponse>,
    requests: Vec<ModelRequest>,
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the conversation script, which
/// is how the model should respond to each request. Every request consumes
/// the next preset response in the order they were added, and is recorded
/// so tests can inspect what the model has been sent. If there are no
/// enough responses in the script, an error will be returned.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
}

impl TestModelProvider {
    /// Appends a response to the script.
    #[inline]
    pub fn add_response(&mut self, preset: PresetResponse) {
        self.lock().responses.push_back(preset);
    }

    /// Sets the delay before each event.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns the requests received so far.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.lock().requests.clone()
    }

    /// Returns the number of responses not consumed yet.
    pub fn remaining_responses(&self) -> usize {
        self.lock().responses.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        // A poisoned script only happens when a test already panicked.
        self.script.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl Debug for TestModelProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestModelProvider")
            .field("remaining_responses", &self.remaining_responses())
            .field("delay", &self.delay)
            .finish()
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let mut script = self.lock();
        script.requests.push(req.clone());

        let result = 'blk: {
            let Some(mut preset) = script.responses.pop_front() else {
                break 'blk Err(Error {
                    message: "no enough responses",
                    kind: ErrorKind::Other,
                });
            };

            match preset.failures {
                Some(0) => {
                    script.responses.push_front(preset);
                    break 'blk Err(Error {
                        message: "preset failure",
                        kind: ErrorKind::RateLimitExceeded,
                    });
                }
                Some(n) => {
                    preset.failures = (n > 1).then(|| n - 1);
                    script.responses.push_front(preset);
                    break 'blk Err(Error {
                        message: "preset failure",
                        kind: ErrorKind::RateLimitExceeded,
                    });
                }
                None => {}
            }

            let mut events: VecDeque<_> =
                preset.events.iter().map(PresetEvent::to_event).collect();
            if preset.completed {
                events.push_back(ModelResponseEvent::Completed);
            }
            Ok(TestModelResponse {
                events,
                delay: preset
                    .event_delay
                    .or(self.delay)
                    .unwrap_or(Duration::from_millis(1)),
                sleep: None,
            })
        };
        ready(result)
    }
}
