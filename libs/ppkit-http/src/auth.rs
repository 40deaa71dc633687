//! Authorization seam for the executor.

use async_trait::async_trait;
use http::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::HttpError;

/// Supplies the `Authorization` header for outgoing requests.
///
/// Resolved per request so implementations can scope tokens by host
/// (the admin API and each data-service instance use different audiences).
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Authorization header value for `url`, or `None` to send the request
    /// unauthenticated.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::InvalidHeaderValue` if the credential is not a valid
    /// header value.
    async fn authorization(&self, url: &Url) -> Result<Option<HeaderValue>, HttpError>;
}

/// Fixed bearer token used for every request.
pub struct StaticBearerToken {
    token: SecretString,
}

impl StaticBearerToken {
    #[must_use]
    pub fn new(token: SecretString) -> Self {
        Self { token }
    }
}

impl std::fmt::Debug for StaticBearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticBearerToken")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl AuthProvider for StaticBearerToken {
    async fn authorization(&self, _url: &Url) -> Result<Option<HeaderValue>, HttpError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.token.expose_secret()))?;
        value.set_sensitive(true);
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_bearer_token_header() {
        let auth = StaticBearerToken::new(SecretString::from("abc123"));
        let url = Url::parse("https://api.bap.microsoft.com/").unwrap();

        let value = auth.authorization(&url).await.unwrap().unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer abc123");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_debug_redacts_token() {
        let auth = StaticBearerToken::new(SecretString::from("abc123"));
        assert!(!format!("{auth:?}").contains("abc123"));
    }

    #[tokio::test]
    async fn test_invalid_token_is_rejected() {
        let auth = StaticBearerToken::new(SecretString::from("bad\ntoken"));
        let url = Url::parse("https://api.bap.microsoft.com/").unwrap();

        let err = auth.authorization(&url).await.unwrap_err();
        assert!(matches!(err, HttpError::InvalidHeaderValue(_)));
    }
}
