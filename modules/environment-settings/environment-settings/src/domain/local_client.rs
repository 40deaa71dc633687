//! Local (in-process) client for the environment-settings module.

use std::sync::Arc;

use async_trait::async_trait;
use environment_settings_sdk::{
    EnvironmentDescriptor, EnvironmentSettingsClient, EnvironmentSettingsError,
    OrganizationSettings, OrganizationSettingsPatch,
};
use tokio_util::sync::CancellationToken;

use super::{DomainError, EnvironmentSettingsService};

/// Local client wrapping the service.
pub struct EnvironmentSettingsLocalClient {
    svc: Arc<EnvironmentSettingsService>,
}

impl EnvironmentSettingsLocalClient {
    #[must_use]
    pub fn new(svc: Arc<EnvironmentSettingsService>) -> Self {
        Self { svc }
    }
}

fn log_and_convert(op: &str, environment_id: &str, e: DomainError) -> EnvironmentSettingsError {
    if matches!(e, DomainError::Cancelled { .. }) {
        tracing::debug!(
            operation = op,
            environment_id,
            error = %e,
            "environment-settings call cancelled"
        );
    } else {
        tracing::error!(
            operation = op,
            environment_id,
            error = ?e,
            "environment-settings call failed"
        );
    }
    e.into()
}

#[async_trait]
impl EnvironmentSettingsClient for EnvironmentSettingsLocalClient {
    async fn resolve_environment(
        &self,
        ctx: &CancellationToken,
        environment_id: &str,
    ) -> Result<EnvironmentDescriptor, EnvironmentSettingsError> {
        self.svc
            .resolve_environment(ctx, environment_id)
            .await
            .map_err(|e| log_and_convert("resolve_environment", environment_id, e))
    }

    async fn resolve_host(
        &self,
        ctx: &CancellationToken,
        environment_id: &str,
    ) -> Result<String, EnvironmentSettingsError> {
        self.svc
            .resolve_host(ctx, environment_id)
            .await
            .map_err(|e| log_and_convert("resolve_host", environment_id, e))
    }

    async fn get_settings(
        &self,
        ctx: &CancellationToken,
        environment_id: &str,
    ) -> Result<OrganizationSettings, EnvironmentSettingsError> {
        self.svc
            .get_settings(ctx, environment_id)
            .await
            .map_err(|e| log_and_convert("get_settings", environment_id, e))
    }

    async fn update_settings(
        &self,
        ctx: &CancellationToken,
        environment_id: &str,
        patch: &OrganizationSettingsPatch,
    ) -> Result<OrganizationSettings, EnvironmentSettingsError> {
        self.svc
            .update_settings(ctx, environment_id, patch)
            .await
            .map_err(|e| log_and_convert("update_settings", environment_id, e))
    }

    async fn has_linked_service(
        &self,
        ctx: &CancellationToken,
        environment_id: &str,
    ) -> Result<bool, EnvironmentSettingsError> {
        self.svc
            .has_linked_service(ctx, environment_id)
            .await
            .map_err(|e| log_and_convert("has_linked_service", environment_id, e))
    }
}
