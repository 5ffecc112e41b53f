use std::fmt::Debug;

use base64::Engine as _;
use base64::engine::general_purpose;
use omo_model::ErrorKind;
use serde::Deserialize;

use crate::Error;

const DEFAULT_MODEL: &str = "gpt-5.2-codex";
const DEFAULT_BASE_URL: &str = "https://chatgpt.com/backend-api/codex";
const DEFAULT_ORIGINATOR: &str = "omo";

/// Builder for [`ResponsesConfig`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ResponsesConfigBuilder {
    access_token: String,
    account_id: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    originator: Option<String>,
}

impl ResponsesConfigBuilder {
    /// Creates a builder with the given OAuth access token.
    #[inline]
    pub fn with_access_token<S: Into<String>>(access_token: S) -> Self {
        Self {
            access_token: access_token.into(),
            account_id: None,
            model: None,
            base_url: None,
            originator: None,
        }
    }

    /// Sets the account id explicitly.
    ///
    /// When absent, the account id is read from the access token claims.
    #[inline]
    pub fn with_account_id<S: Into<String>>(mut self, account_id: S) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// Sets the model to use.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets a custom base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the `originator` header value.
    #[inline]
    pub fn with_originator<S: Into<String>>(mut self, originator: S) -> Self {
        self.originator = Some(originator.into());
        self
    }

    /// Builds the configuration.
    ///
    /// Fails if the access token is empty, or no account id is given and
    /// none can be extracted from the token.
    pub fn build(self) -> Result<ResponsesConfig, Error> {
        let access_token = self.access_token.trim().to_owned();
        if access_token.is_empty() {
            return Err(Error::new("Missing access token", ErrorKind::Other));
        }
        let account_id = match self.account_id.as_deref().and_then(non_empty) {
            Some(account_id) => account_id,
            None => extract_account_id(&access_token).ok_or_else(|| {
                Error::new(
                    "Failed to extract account id from token",
                    ErrorKind::Other,
                )
            })?,
        };
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();

        Ok(ResponsesConfig {
            access_token,
            account_id,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            base_url,
            originator: self
                .originator
                .unwrap_or_else(|| DEFAULT_ORIGINATOR.to_owned()),
        })
    }
}

impl Debug for ResponsesConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponsesConfigBuilder")
            .field("access_token", &"<deducted>")
            .field("account_id", &self.account_id)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("originator", &self.originator)
            .finish()
    }
}

/// Configuration for the Responses API provider.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ResponsesConfig {
    pub(crate) access_token: String,
    pub(crate) account_id: String,
    pub(crate) model: String,
    pub(crate) base_url: String,
    pub(crate) originator: String,
}

impl ResponsesConfig {
    /// Returns the model identifier sent with every request.
    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the resolved account id.
    #[inline]
    pub fn account_id(&self) -> &str {
        &self.account_id
    }
}

impl Debug for ResponsesConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponsesConfig")
            .field("access_token", &"<deducted>")
            .field("account_id", &self.account_id)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("originator", &self.originator)
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenClaims {
    #[serde(rename = "https://api.openai.com/auth")]
    auth: Option<AuthClaims>,
}

#[derive(Deserialize)]
struct AuthClaims {
    chatgpt_account_id: Option<String>,
}

fn extract_account_id(token: &str) -> Option<String> {
    let mut parts = token.split('.');
    let (_header, payload, _signature) =
        (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let decoded = general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| general_purpose::URL_SAFE.decode(payload))
        .ok()?;
    let claims: TokenClaims = serde_json::from_slice(&decoded).ok()?;
    claims.auth?.chatgpt_account_id.as_deref().and_then(non_empty)
}

#[inline]
fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_token(claims: &str) -> String {
        let payload = general_purpose::URL_SAFE_NO_PAD.encode(claims);
        format!("eyJhbGciOiJub25lIn0.{payload}.c2ln")
    }

    #[test]
    fn test_account_id_from_token() {
        let token = make_token(
            r#"{"https://api.openai.com/auth":{"chatgpt_account_id":"acct_42"}}"#,
        );
        let config = ResponsesConfigBuilder::with_access_token(token)
            .build()
            .unwrap();
        assert_eq!(config.account_id(), "acct_42");
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_explicit_account_id_wins() {
        let config = ResponsesConfigBuilder::with_access_token("opaque")
            .with_account_id("acct_explicit")
            .with_base_url("http://localhost:8080/")
            .build()
            .unwrap();
        assert_eq!(config.account_id(), "acct_explicit");
        assert_eq!(config.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_missing_account_id() {
        let token = make_token(r#"{"sub":"someone"}"#);
        let err = ResponsesConfigBuilder::with_access_token(token)
            .build()
            .unwrap_err();
        assert!(err.message().contains("account id"));

        assert!(ResponsesConfigBuilder::with_access_token("  ").build().is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ResponsesConfigBuilder::with_access_token("secret-token")
            .with_account_id("acct")
            .build()
            .unwrap();
        assert!(!format!("{config:?}").contains("secret-token"));
    }
}
