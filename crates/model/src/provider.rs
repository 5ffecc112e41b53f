use std::error::Error;

use crate::error::ErrorKind;
use crate::request::ModelRequest;
use crate::response::ModelResponse;

/// The error type for a model provider.
///
/// Errors of this type are transport-level failures: the request could not
/// be sent, the endpoint answered with a non-success status, or the byte
/// stream broke. Errors reported by the endpoint inside the stream are
/// delivered as [`ModelResponseEvent::Error`](crate::ModelResponseEvent)
/// records instead.
pub trait ModelProviderError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A type that represents a model endpoint, which accepts a request and
/// answers with a stream of records.
///
/// Once the provider is created, it should behave like a stateless object.
/// It can still have internal state, but callers should not rely on it,
/// and the provider should be prepared for being dropped anytime.
pub trait ModelProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: ModelProviderError;

    /// The response type for this provider.
    type Response: ModelResponse<Error = Self::Error>;

    /// Sends a request to the model.
    ///
    /// The returned future resolves once the endpoint has accepted the
    /// request and the response stream is ready to be polled.
    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static;
}
