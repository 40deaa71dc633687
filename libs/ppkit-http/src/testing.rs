//! Scripted in-memory executor for tests.
//!
//! Routes are matched on method and URL path. Each route holds a queue of
//! replies; the last reply repeats once the queue is down to one entry.
//! Every executed call is recorded so tests can assert order and counts.

use std::collections::VecDeque;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, StatusCode};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::HttpError;
use crate::executor::ApiExecutor;
use crate::request::ApiRequest;
use crate::response::ApiResponse;

/// A canned reply for a scripted route.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Respond with this status and body
    Status(StatusCode, Bytes),
    /// Fail with `HttpError::Transport` carrying this message
    Transport(String),
}

impl Reply {
    /// `status` with a JSON body.
    #[must_use]
    pub fn json(status: StatusCode, body: &serde_json::Value) -> Self {
        Self::Status(status, Bytes::from(body.to_string()))
    }

    /// `status` with a raw (possibly malformed) body.
    #[must_use]
    pub fn raw(status: StatusCode, body: &'static str) -> Self {
        Self::Status(status, Bytes::from_static(body.as_bytes()))
    }

    /// `status` with an empty body.
    #[must_use]
    pub fn empty(status: StatusCode) -> Self {
        Self::Status(status, Bytes::new())
    }
}

/// One call observed by a [`ScriptedExecutor`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub url: Url,
    pub body: Option<Bytes>,
}

impl RecordedCall {
    /// Body decoded as JSON, if there was one.
    #[must_use]
    pub fn json_body(&self) -> Option<serde_json::Value> {
        self.body
            .as_ref()
            .and_then(|body| serde_json::from_slice(body).ok())
    }
}

struct Route {
    method: Method,
    path: String,
    replies: VecDeque<Reply>,
}

/// In-memory [`ApiExecutor`] driven by scripted replies.
#[derive(Default)]
pub struct ScriptedExecutor {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script `reply` for `method` + `path`. Repeated calls for the same
    /// route queue replies in order.
    #[must_use]
    pub fn on(self, method: Method, path: &str, reply: Reply) -> Self {
        {
            let mut routes = self.routes.lock();
            if let Some(route) = routes
                .iter_mut()
                .find(|r| r.method == method && r.path == path)
            {
                route.replies.push_back(reply);
            } else {
                routes.push(Route {
                    method,
                    path: path.to_owned(),
                    replies: VecDeque::from([reply]),
                });
            }
        }
        self
    }

    /// All calls executed so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Number of calls executed with `method`.
    #[must_use]
    pub fn count(&self, method: &Method) -> usize {
        self.calls.lock().iter().filter(|c| c.method == method).count()
    }

    fn next_reply(&self, method: &Method, path: &str) -> Option<Reply> {
        let mut routes = self.routes.lock();
        let route = routes
            .iter_mut()
            .find(|r| r.method == method && r.path == path)?;
        if route.replies.len() > 1 {
            route.replies.pop_front()
        } else {
            route.replies.front().cloned()
        }
    }
}

#[async_trait]
impl ApiExecutor for ScriptedExecutor {
    async fn execute(
        &self,
        ctx: &CancellationToken,
        request: ApiRequest,
    ) -> Result<ApiResponse, HttpError> {
        if ctx.is_cancelled() {
            return Err(HttpError::Cancelled);
        }

        self.calls.lock().push(RecordedCall {
            method: request.method().clone(),
            url: request.url().clone(),
            body: request.body().cloned(),
        });

        let reply = self
            .next_reply(request.method(), request.url().path())
            .ok_or_else(|| {
                HttpError::Transport(
                    format!(
                        "no scripted reply for {} {}",
                        request.method(),
                        request.url()
                    )
                    .into(),
                )
            })?;

        match reply {
            Reply::Status(status, body) => {
                request.check_status(status, &body)?;
                Ok(ApiResponse::from_parts(status, body))
            }
            Reply::Transport(message) => Err(HttpError::Transport(message.into())),
        }
    }
}
