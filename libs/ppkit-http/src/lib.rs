#![warn(warnings)]

//! HTTP execution seam for Power Platform API clients
//!
//! Clients in this workspace never talk to a transport directly. They build an
//! [`ApiRequest`] (method, URL, headers, body, acceptable status codes) and hand
//! it to an [`ApiExecutor`] together with a `CancellationToken`.
//!
//! This crate provides:
//! - [`ApiExecutor`] - the seam, object-safe and `Send + Sync`
//! - [`HttpExecutor`] - hyper + rustls implementation (HTTPS only by default)
//! - [`AuthProvider`] / [`StaticBearerToken`] - per-request authorization
//! - `testing::ScriptedExecutor` - in-memory fake (feature `testing`)
//!
//! # Example
//!
//! ```ignore
//! use ppkit_http::{ApiExecutor, ApiRequest, HttpExecutor};
//! use http::StatusCode;
//!
//! let executor = HttpExecutor::builder()
//!     .timeout(Duration::from_secs(10))
//!     .build()?;
//!
//! let response = executor
//!     .execute(&ctx, ApiRequest::get(url).expect_status(StatusCode::OK))
//!     .await?;
//! let data: MyData = response.json()?;
//! ```

mod auth;
mod client;
mod config;
mod error;
mod executor;
mod request;
mod response;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
mod tls;

pub use auth::{AuthProvider, StaticBearerToken};
pub use client::{HttpExecutor, HttpExecutorBuilder};
pub use config::{
    DEFAULT_MAX_BODY_SIZE, DEFAULT_USER_AGENT, HttpExecutorConfig, TlsRootConfig,
    TransportSecurity,
};
pub use error::{ERROR_BODY_PREVIEW_LIMIT, HttpError};
pub use executor::ApiExecutor;
pub use request::ApiRequest;
pub use response::ApiResponse;

// Re-exported so callers can name methods and status codes without a direct
// `http` dependency.
pub use http::{Method, StatusCode};
