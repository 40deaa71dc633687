use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE, HeaderName, HeaderValue};
use http::{Method, StatusCode};
use serde::Serialize;
use url::Url;

use crate::error::HttpError;

/// A single API call handed to an [`ApiExecutor`](crate::ApiExecutor).
///
/// Carries everything the executor needs: method, absolute URL, headers,
/// optional body and the set of status codes the caller treats as success.
/// An empty `expected_status` set means "any 2xx".
///
/// # Example
///
/// ```ignore
/// let request = ApiRequest::patch(url)
///     .json(&patch)?
///     .expect_status(StatusCode::NO_CONTENT);
/// let response = executor.execute(&ctx, request).await?;
/// ```
#[derive(Debug, Clone)]
#[must_use = "ApiRequest does nothing until handed to an executor"]
pub struct ApiRequest {
    method: Method,
    url: Url,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Option<Bytes>,
    expected_status: Vec<StatusCode>,
}

impl ApiRequest {
    /// Create a request with the given method. Requests accept JSON by default.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: vec![(ACCEPT, HeaderValue::from_static("application/json"))],
            body: None,
            expected_status: Vec::new(),
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn patch(url: Url) -> Self {
        Self::new(Method::PATCH, url)
    }

    /// Add a header, replacing any earlier value with the same name.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.retain(|(existing, _)| existing != name);
        self.headers.push((name, value));
        self
    }

    /// Set request body as JSON
    ///
    /// Sets Content-Type to application/json unless one was already provided.
    ///
    /// # Errors
    ///
    /// Returns `Err(HttpError::Json)` if serialization fails.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, HttpError> {
        let bytes = serde_json::to_vec(body)?;
        if !self.headers.iter().any(|(name, _)| name == CONTENT_TYPE) {
            self.headers
                .push((CONTENT_TYPE, HeaderValue::from_static("application/json")));
        }
        self.body = Some(Bytes::from(bytes));
        Ok(self)
    }

    /// Declare a status code as acceptable. May be called more than once.
    pub fn expect_status(mut self, status: StatusCode) -> Self {
        if !self.expected_status.contains(&status) {
            self.expected_status.push(status);
        }
        self
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    #[must_use]
    pub fn expected_status(&self) -> &[StatusCode] {
        &self.expected_status
    }

    /// Whether `status` counts as success for this request.
    #[must_use]
    pub fn accepts(&self, status: StatusCode) -> bool {
        if self.expected_status.is_empty() {
            status.is_success()
        } else {
            self.expected_status.contains(&status)
        }
    }

    /// Check a received status against the acceptable set.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::UnexpectedStatus` with a preview of `body` when the
    /// status is not acceptable.
    pub fn check_status(&self, status: StatusCode, body: &[u8]) -> Result<(), HttpError> {
        if self.accepts(status) {
            Ok(())
        } else {
            Err(HttpError::unexpected_status(
                status,
                &self.expected_status,
                body,
            ))
        }
    }
}
