//! A model provider for the streaming Responses API.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use mime::Mime;
use omo_model::{ErrorKind, ModelProvider, ModelProviderError, ModelRequest};
use reqwest::{Client, StatusCode, header};

pub use config::{ResponsesConfig, ResponsesConfigBuilder};
use io::{Chunks, Sse};
pub use response::ResponsesResponse;

/// Error type for [`ResponsesProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Responses API model provider.
#[derive(Clone, Debug)]
pub struct ResponsesProvider {
    client: Client,
    config: Arc<ResponsesConfig>,
}

impl ResponsesProvider {
    /// Creates a new `ResponsesProvider` with the given configuration.
    #[inline]
    pub fn new(config: ResponsesConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl ModelProvider for ResponsesProvider {
    type Error = Error;
    type Response = ResponsesResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let body = proto::create_request(req, &self.config);
        let resp_fut = self
            .client
            .post(format!("{}{}", self.config.base_url, "/responses"))
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.config.access_token),
            )
            .header("chatgpt-account-id", &self.config.account_id)
            .header("OpenAI-Beta", "responses=experimental")
            .header("originator", &self.config.originator)
            .header(header::USER_AGENT, user_agent(&self.config.originator))
            .header(header::ACCEPT, "text/event-stream")
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send();

        async move {
            let resp = resp_fut.await.map_err(|err| {
                Error::new(format!("Request failed: {err}"), ErrorKind::Other)
            })?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                let kind = if status == StatusCode::TOO_MANY_REQUESTS {
                    ErrorKind::RateLimitExceeded
                } else {
                    ErrorKind::Other
                };
                return Err(Error::new(
                    format!("API Error {}: {body}", status.as_u16()),
                    kind,
                ));
            }

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let is_event_stream = content_type
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| m.subtype().as_str() == "event-stream")
                .unwrap_or(false);
            if !is_event_stream {
                return Err(Error::new(
                    format!("Unexpected content type: {content_type:?}"),
                    ErrorKind::Other,
                ));
            }

            // Here we got a successful response.
            let chunks = Chunks::from_response(resp);
            let sse = Sse::new(chunks);
            Ok(ResponsesResponse::from_sse(sse))
        }
    }
}

#[inline]
fn user_agent(originator: &str) -> String {
    format!(
        "{originator} ({} {}; {})",
        std::env::consts::OS,
        std::env::consts::FAMILY,
        std::env::consts::ARCH
    )
}
