use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default User-Agent string for HTTP requests
pub const DEFAULT_USER_AGENT: &str = concat!("ppkit-http/", env!("CARGO_PKG_VERSION"));

/// Default ceiling for a single response body (10 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// TLS root certificate source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsRootConfig {
    /// Mozilla root set bundled via `webpki-roots`
    #[default]
    #[serde(rename = "webpki")]
    WebPki,
    /// Operating system certificate store
    Native,
}

/// Transport security mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportSecurity {
    /// Require TLS for all connections (HTTPS only) - default and recommended
    #[default]
    TlsOnly,
    /// Allow insecure HTTP connections (for testing with mock servers only)
    AllowInsecureHttp,
}

/// Executor configuration.
///
/// Loaded from the `http` section of the application config. Transport
/// security is deliberately not configurable from files; see
/// [`HttpExecutorBuilder::allow_insecure_http`](crate::HttpExecutorBuilder::allow_insecure_http).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpExecutorConfig {
    /// Per-request timeout (default: 30 seconds)
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Maximum response body size in bytes
    pub max_body_size: usize,

    /// TLS root certificate strategy (default: `WebPki`)
    pub tls_roots: TlsRootConfig,

    /// Idle pooled connections are closed after this long
    #[serde(with = "humantime_serde")]
    pub pool_idle_timeout: Duration,

    #[serde(skip)]
    pub transport: TransportSecurity,
}

impl Default for HttpExecutorConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            tls_roots: TlsRootConfig::default(),
            pool_idle_timeout: Duration::from_secs(90),
            transport: TransportSecurity::TlsOnly,
        }
    }
}
