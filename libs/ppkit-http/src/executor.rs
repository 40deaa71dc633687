use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::HttpError;
use crate::request::ApiRequest;
use crate::response::ApiResponse;

/// Executes one API call.
///
/// Implementations own transport, authentication and any retry policy.
/// Contract:
/// - `ctx` is checked before the call is issued; a cancelled token yields
///   [`HttpError::Cancelled`] without touching the network.
/// - a status outside [`ApiRequest::expected_status`] yields
///   [`HttpError::UnexpectedStatus`].
/// - the body is returned undecoded; callers use [`ApiResponse::json`].
///
/// `HttpExecutor` is the production implementation; tests substitute a
/// scripted fake.
#[async_trait]
pub trait ApiExecutor: Send + Sync {
    /// Execute `request`, honouring `ctx` for cancellation.
    ///
    /// # Errors
    ///
    /// Returns an [`HttpError`] on transport failure, cancellation, timeout or
    /// an unacceptable status code.
    async fn execute(
        &self,
        ctx: &CancellationToken,
        request: ApiRequest,
    ) -> Result<ApiResponse, HttpError>;
}
