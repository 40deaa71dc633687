//! Public API trait for the environment-settings module.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::EnvironmentSettingsError;
use crate::models::{EnvironmentDescriptor, OrganizationSettings, OrganizationSettingsPatch};

/// Public API for environment settings.
///
/// ```ignore
/// let client: Arc<dyn EnvironmentSettingsClient> = module.client();
///
/// if client.has_linked_service(&ctx, env_id).await? {
///     let settings = client.get_settings(&ctx, env_id).await?;
///     let patch = OrganizationSettingsPatch::new().audit_enabled(true);
///     let updated = client.update_settings(&ctx, env_id, &patch).await?;
/// }
/// ```
///
/// # Cancellation
///
/// `ctx` is threaded into every remote call. A token that is already
/// cancelled fails the operation before any call is issued.
#[async_trait]
pub trait EnvironmentSettingsClient: Send + Sync {
    /// Fetch the environment descriptor from the admin API.
    ///
    /// # Errors
    ///
    /// Fails with `UnexpectedStatus`, `Transport`, `Decode` or `Cancelled`.
    async fn resolve_environment(
        &self,
        ctx: &CancellationToken,
        environment_id: &str,
    ) -> Result<EnvironmentDescriptor, EnvironmentSettingsError>;

    /// Resolve the host of the environment's linked data service.
    ///
    /// Returns the host only (with a port if the instance URL names one).
    ///
    /// # Errors
    ///
    /// - `EnvironmentNotLinked` if no data service is attached
    /// - `InvalidInstanceUrl` if the instance URL is malformed
    /// - any error of [`resolve_environment`](Self::resolve_environment)
    async fn resolve_host(
        &self,
        ctx: &CancellationToken,
        environment_id: &str,
    ) -> Result<String, EnvironmentSettingsError>;

    /// Read the organization settings record.
    ///
    /// # Errors
    ///
    /// - `EmptySettingsCollection` if the service returns no record
    /// - any error of [`resolve_host`](Self::resolve_host)
    /// - `UnexpectedStatus`, `Transport`, `Decode` or `Cancelled` from the read
    async fn get_settings(
        &self,
        ctx: &CancellationToken,
        environment_id: &str,
    ) -> Result<OrganizationSettings, EnvironmentSettingsError>;

    /// Apply `patch` and return the record as re-read after the update.
    ///
    /// Issues, in order: read (for the organization id), PATCH, read. Nothing
    /// is rolled back if a later step fails.
    ///
    /// # Errors
    ///
    /// - `MissingOrganizationId` if the current record has no id
    /// - any error of [`get_settings`](Self::get_settings)
    /// - `UnexpectedStatus`, `Transport` or `Cancelled` from the PATCH
    async fn update_settings(
        &self,
        ctx: &CancellationToken,
        environment_id: &str,
        patch: &OrganizationSettingsPatch,
    ) -> Result<OrganizationSettings, EnvironmentSettingsError>;

    /// Whether the environment has a linked data service.
    ///
    /// "Not linked" is reported as `Ok(false)`, never as an error.
    ///
    /// # Errors
    ///
    /// Any error of [`resolve_environment`](Self::resolve_environment).
    async fn has_linked_service(
        &self,
        ctx: &CancellationToken,
        environment_id: &str,
    ) -> Result<bool, EnvironmentSettingsError>;
}
