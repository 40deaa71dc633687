use std::sync::Arc;

use environment_settings_sdk::{
    EnvironmentDescriptor, OrganizationSettings, OrganizationSettingsPatch, SettingsOperation,
};
use ppkit_http::{ApiExecutor, ApiRequest, ApiResponse, StatusCode};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::config::EnvironmentSettingsConfig;
use crate::domain::error::DomainError;
use crate::domain::urls;
use crate::infra::dto::{EnvironmentDto, OrganizationsEnvelopeDto};

/// Environment settings service.
///
/// Holds no state between calls: every operation resolves the environment
/// afresh and issues its remote calls strictly in sequence.
#[derive(Clone)]
pub struct EnvironmentSettingsService {
    executor: Arc<dyn ApiExecutor>,
    config: EnvironmentSettingsConfig,
}

impl EnvironmentSettingsService {
    #[must_use]
    pub fn new(executor: Arc<dyn ApiExecutor>, config: EnvironmentSettingsConfig) -> Self {
        Self { executor, config }
    }

    /// Fetch the environment descriptor from the admin API.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Http`, `Decode` or `Cancelled` for the admin call.
    #[instrument(skip(self, ctx))]
    pub async fn resolve_environment(
        &self,
        ctx: &CancellationToken,
        environment_id: &str,
    ) -> Result<EnvironmentDescriptor, DomainError> {
        let op = SettingsOperation::ResolveEnvironment;
        let url = urls::environment_url(
            &self.config.bapi_host,
            &self.config.admin_api_version,
            environment_id,
        )
        .map_err(|source| request_url(op, environment_id, source))?;

        let request = ApiRequest::get(url).expect_status(StatusCode::OK);
        let response = self.call(ctx, op, environment_id, request).await?;
        let dto: EnvironmentDto = decode(op, environment_id, &response)?;

        let descriptor = EnvironmentDescriptor::from(dto);
        debug!(
            linked = descriptor.has_linked_service(),
            "resolved environment"
        );
        Ok(descriptor)
    }

    /// Resolve the host of the environment's linked data service.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotLinked` for an empty instance URL and
    /// `DomainError::InvalidInstanceUrl` for one without a usable host.
    #[instrument(skip(self, ctx))]
    pub async fn resolve_host(
        &self,
        ctx: &CancellationToken,
        environment_id: &str,
    ) -> Result<String, DomainError> {
        let descriptor = self.resolve_environment(ctx, environment_id).await?;
        let instance_url = descriptor.linked_service.instance_url;

        let host = urls::instance_host(&instance_url)
            .map_err(|source| DomainError::InvalidInstanceUrl {
                environment_id: environment_id.to_owned(),
                url: instance_url,
                source,
            })?
            .ok_or_else(|| DomainError::not_linked(environment_id))?;

        debug!(%host, "resolved data service host");
        Ok(host)
    }

    /// Read the organization settings record.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EmptySettingsCollection` when no record comes
    /// back, or any host-resolution or read failure.
    #[instrument(skip(self, ctx))]
    pub async fn get_settings(
        &self,
        ctx: &CancellationToken,
        environment_id: &str,
    ) -> Result<OrganizationSettings, DomainError> {
        let host = self.resolve_host(ctx, environment_id).await?;
        self.read_settings(ctx, environment_id, &host).await
    }

    /// Apply `patch`, then re-read and return the record.
    ///
    /// The host is resolved once and reused for the read, PATCH and re-read.
    /// The record is addressed by the id from the first read only.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::MissingOrganizationId` when the first read has
    /// no id; any failing step aborts the rest and nothing is rolled back.
    #[instrument(skip(self, ctx, patch), fields(fields = patch.fields().len()))]
    pub async fn update_settings(
        &self,
        ctx: &CancellationToken,
        environment_id: &str,
        patch: &OrganizationSettingsPatch,
    ) -> Result<OrganizationSettings, DomainError> {
        let host = self.resolve_host(ctx, environment_id).await?;

        let current = self.read_settings(ctx, environment_id, &host).await?;
        let organization_id =
            current
                .organization_id
                .ok_or_else(|| DomainError::MissingOrganizationId {
                    environment_id: environment_id.to_owned(),
                })?;

        self.patch_settings(ctx, environment_id, &host, &organization_id, patch)
            .await?;
        info!(%organization_id, "organization settings patched");

        self.read_settings(ctx, environment_id, &host).await
    }

    /// Whether the environment has a linked data service.
    ///
    /// # Errors
    ///
    /// Fails only when the admin lookup fails.
    #[instrument(skip(self, ctx))]
    pub async fn has_linked_service(
        &self,
        ctx: &CancellationToken,
        environment_id: &str,
    ) -> Result<bool, DomainError> {
        let descriptor = self.resolve_environment(ctx, environment_id).await?;
        Ok(descriptor.has_linked_service())
    }

    async fn read_settings(
        &self,
        ctx: &CancellationToken,
        environment_id: &str,
        host: &str,
    ) -> Result<OrganizationSettings, DomainError> {
        let op = SettingsOperation::ReadSettings;
        let url = urls::organizations_url(host, &self.config.dataverse_api_version)
            .map_err(|source| request_url(op, environment_id, source))?;

        let request = ApiRequest::get(url).expect_status(StatusCode::OK);
        let response = self.call(ctx, op, environment_id, request).await?;
        let envelope: OrganizationsEnvelopeDto = decode(op, environment_id, &response)?;

        envelope
            .value
            .into_iter()
            .next()
            .map(OrganizationSettings::from)
            .ok_or_else(|| DomainError::EmptySettingsCollection {
                environment_id: environment_id.to_owned(),
            })
    }

    async fn patch_settings(
        &self,
        ctx: &CancellationToken,
        environment_id: &str,
        host: &str,
        organization_id: &str,
        patch: &OrganizationSettingsPatch,
    ) -> Result<(), DomainError> {
        let op = SettingsOperation::PatchSettings;
        let url = urls::organization_url(host, &self.config.dataverse_api_version, organization_id)
            .map_err(|source| request_url(op, environment_id, source))?;

        let request = ApiRequest::patch(url)
            .json(patch.fields())
            .map_err(|source| http(op, environment_id, source))?
            .expect_status(StatusCode::NO_CONTENT);
        self.call(ctx, op, environment_id, request).await?;
        Ok(())
    }

    /// Run one remote call, refusing to start it once `ctx` is cancelled.
    async fn call(
        &self,
        ctx: &CancellationToken,
        op: SettingsOperation,
        environment_id: &str,
        request: ApiRequest,
    ) -> Result<ApiResponse, DomainError> {
        if ctx.is_cancelled() {
            return Err(DomainError::cancelled(op, environment_id));
        }

        debug!(
            operation = %op,
            method = %request.method(),
            url = %request.url(),
            "calling remote api"
        );
        self.executor
            .execute(ctx, request)
            .await
            .map_err(|source| http(op, environment_id, source))
    }
}

fn decode<T: DeserializeOwned>(
    op: SettingsOperation,
    environment_id: &str,
    response: &ApiResponse,
) -> Result<T, DomainError> {
    response.json().map_err(|source| DomainError::Decode {
        operation: op,
        environment_id: environment_id.to_owned(),
        source,
    })
}

fn http(op: SettingsOperation, environment_id: &str, source: ppkit_http::HttpError) -> DomainError {
    DomainError::Http {
        operation: op,
        environment_id: environment_id.to_owned(),
        source,
    }
}

fn request_url(
    op: SettingsOperation,
    environment_id: &str,
    source: url::ParseError,
) -> DomainError {
    DomainError::RequestUrl {
        operation: op,
        environment_id: environment_id.to_owned(),
        source,
    }
}
