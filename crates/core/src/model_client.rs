use std::future::poll_fn;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use omo_model::{
    ModelProvider, ModelProviderError, ModelRequest, ModelResponse,
    ModelResponseEvent,
};
use tracing::Instrument;

type NextEventResult =
    Result<Option<ModelResponseEvent>, Box<dyn ModelProviderError>>;
type SendRequestResult =
    Result<ModelClientResponse, Box<dyn ModelProviderError>>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type HandlerFn =
    Arc<dyn Fn(ModelRequest) -> BoxedSendRequestFuture + Send + Sync>;

/// A wrapper around a model provider that provides a type-erased
/// interface for the other modules.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req| {
            trace!("sending a request: {req:?}");
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    match fut.await {
                        Ok(resp) => Ok(ModelClientResponse {
                            inner: Box::pin(resp),
                        }),
                        Err(err) => {
                            error!("failed to send request: {err}");
                            Err(Box::new(err) as Box<dyn ModelProviderError>)
                        }
                    }
                }
                .instrument(trace_span!("model client req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a request and returns the response stream.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. Dropping the returned future abandons
    /// the request.
    #[inline]
    pub async fn send_request(&self, req: ModelRequest) -> SendRequestResult {
        (self.handler_fn)(req).await
    }
}

trait ErasedResponse: Send {
    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<NextEventResult>;
}

impl<R: ModelResponse> ErasedResponse for R {
    #[inline]
    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<NextEventResult> {
        <R as ModelResponse>::poll_next_event(self, cx).map_err(|err| {
            error!("response stream failed: {err}");
            Box::new(err) as Box<dyn ModelProviderError>
        })
    }
}

/// A response stream whose provider type has been erased.
pub struct ModelClientResponse {
    inner: Pin<Box<dyn ErasedResponse>>,
}

impl ModelClientResponse {
    /// Waits for the next record.
    ///
    /// Returns `Ok(None)` when the stream has ended.
    pub async fn next_event(&mut self) -> NextEventResult {
        let event = poll_fn(|cx| self.inner.as_mut().poll_next_event(cx)).await;
        if let Ok(Some(event)) = &event {
            trace!("got an event: {event:?}");
        }
        event
    }
}
