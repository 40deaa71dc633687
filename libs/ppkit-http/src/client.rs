use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::USER_AGENT;
use http::{HeaderValue, Request};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use tokio_util::sync::CancellationToken;

use crate::auth::AuthProvider;
use crate::config::{HttpExecutorConfig, TransportSecurity};
use crate::error::HttpError;
use crate::executor::ApiExecutor;
use crate::request::ApiRequest;
use crate::response::ApiResponse;
use crate::tls;

type HyperClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Builder for [`HttpExecutor`]
#[must_use]
pub struct HttpExecutorBuilder {
    config: HttpExecutorConfig,
    auth: Option<Arc<dyn AuthProvider>>,
}

impl HttpExecutorBuilder {
    pub fn new() -> Self {
        Self::with_config(HttpExecutorConfig::default())
    }

    pub fn with_config(config: HttpExecutorConfig) -> Self {
        Self { config, auth: None }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn max_body_size(mut self, limit: usize) -> Self {
        self.config.max_body_size = limit;
        self
    }

    /// Attach an authorization provider consulted once per request.
    pub fn auth(mut self, provider: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(provider);
        self
    }

    /// Allow plain `http://` URLs. Intended for mock servers in tests.
    ///
    /// Only available in debug builds or with the `allow-insecure-http` feature.
    #[cfg(any(debug_assertions, feature = "allow-insecure-http"))]
    pub fn allow_insecure_http(mut self) -> Self {
        tracing::warn!(
            target: "ppkit_http::security",
            "allow_insecure_http() called - HTTP traffic will NOT be encrypted"
        );
        self.config.transport = TransportSecurity::AllowInsecureHttp;
        self
    }

    /// Build the executor
    ///
    /// # Errors
    ///
    /// Returns an error if TLS initialization fails or the user agent is not
    /// a valid header value.
    pub fn build(self) -> Result<HttpExecutor, HttpError> {
        let user_agent = HeaderValue::from_str(&self.config.user_agent)?;
        let https = tls::build_https_connector(self.config.tls_roots, self.config.transport)?;

        let client = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(self.config.pool_idle_timeout)
            .build::<_, Full<Bytes>>(https);

        Ok(HttpExecutor {
            client,
            user_agent,
            auth: self.auth,
            request_timeout: self.config.request_timeout,
            max_body_size: self.config.max_body_size,
            transport: self.config.transport,
        })
    }
}

impl Default for HttpExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// hyper-based [`ApiExecutor`].
///
/// One attempt per request: no retries, no redirects. The request races the
/// caller's cancellation token and the configured per-request timeout.
///
/// `HttpExecutor` is `Clone + Send + Sync`; clones share the connection pool.
#[derive(Clone)]
pub struct HttpExecutor {
    client: HyperClient,
    user_agent: HeaderValue,
    auth: Option<Arc<dyn AuthProvider>>,
    request_timeout: Duration,
    max_body_size: usize,
    transport: TransportSecurity,
}

impl std::fmt::Debug for HttpExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpExecutor")
            .field("user_agent", &self.user_agent)
            .field("auth", &self.auth.is_some())
            .field("request_timeout", &self.request_timeout)
            .field("max_body_size", &self.max_body_size)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

impl HttpExecutor {
    pub fn builder() -> HttpExecutorBuilder {
        HttpExecutorBuilder::new()
    }

    /// Create an executor with default configuration
    ///
    /// # Errors
    /// Returns an error if TLS initialization fails
    pub fn new() -> Result<Self, HttpError> {
        HttpExecutorBuilder::new().build()
    }

    fn check_scheme(&self, request: &ApiRequest) -> Result<(), HttpError> {
        let scheme = request.url().scheme();
        match (scheme, self.transport) {
            ("https", _) | ("http", TransportSecurity::AllowInsecureHttp) => Ok(()),
            ("http", TransportSecurity::TlsOnly) => Err(HttpError::InvalidScheme {
                scheme: scheme.to_owned(),
                reason: "HTTPS required (transport security is TlsOnly)".to_owned(),
            }),
            _ => Err(HttpError::InvalidScheme {
                scheme: scheme.to_owned(),
                reason: "only http and https are supported".to_owned(),
            }),
        }
    }

    async fn build_request(&self, request: &ApiRequest) -> Result<Request<Full<Bytes>>, HttpError> {
        let mut builder = Request::builder()
            .method(request.method().clone())
            .uri(request.url().as_str())
            .header(USER_AGENT, self.user_agent.clone());

        for (name, value) in request.headers() {
            builder = builder.header(name, value);
        }

        if let Some(auth) = &self.auth
            && let Some(value) = auth.authorization(request.url()).await?
        {
            builder = builder.header(http::header::AUTHORIZATION, value);
        }

        let body = request.body().cloned().map(Full::new).unwrap_or_default();
        Ok(builder.body(body)?)
    }

    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, HttpError> {
        let hyper_request = self.build_request(request).await?;
        let response = self.client.request(hyper_request).await?;

        let (parts, body) = response.into_parts();
        let body = Limited::new(body, self.max_body_size)
            .collect()
            .await
            .map_err(|e| {
                if e.downcast_ref::<LengthLimitError>().is_some() {
                    HttpError::BodyTooLarge {
                        limit: self.max_body_size,
                    }
                } else {
                    HttpError::Transport(e)
                }
            })?
            .to_bytes();

        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            status = parts.status.as_u16(),
            "api call completed"
        );

        request.check_status(parts.status, &body)?;
        Ok(ApiResponse::new(parts.status, parts.headers, body))
    }
}

#[async_trait]
impl ApiExecutor for HttpExecutor {
    async fn execute(
        &self,
        ctx: &CancellationToken,
        request: ApiRequest,
    ) -> Result<ApiResponse, HttpError> {
        if ctx.is_cancelled() {
            return Err(HttpError::Cancelled);
        }
        self.check_scheme(&request)?;

        tokio::select! {
            biased;
            () = ctx.cancelled() => Err(HttpError::Cancelled),
            result = tokio::time::timeout(self.request_timeout, self.send(&request)) => {
                result.map_err(|_| HttpError::Timeout(self.request_timeout))?
            }
        }
    }
}
