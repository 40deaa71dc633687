//! Environment Settings Module
//!
//! Resolves a Power Platform environment to its linked data service and
//! reads or updates that service's organization settings record.
//!
//! Consumers use the `EnvironmentSettingsClient` trait from
//! `environment-settings-sdk`; [`EnvironmentSettingsModule::client`] returns
//! the in-process implementation backed by any
//! [`ApiExecutor`](ppkit_http::ApiExecutor).

pub mod config;
pub mod domain;
pub mod infra;

use std::sync::Arc;

use environment_settings_sdk::EnvironmentSettingsClient;
use ppkit_http::ApiExecutor;

pub use config::EnvironmentSettingsConfig;
pub use domain::{DomainError, EnvironmentSettingsLocalClient, EnvironmentSettingsService};

/// Wires the service to an executor and hands out clients.
pub struct EnvironmentSettingsModule {
    service: Arc<EnvironmentSettingsService>,
}

impl EnvironmentSettingsModule {
    #[must_use]
    pub fn new(executor: Arc<dyn ApiExecutor>, config: EnvironmentSettingsConfig) -> Self {
        tracing::debug!(
            bapi_host = %config.bapi_host,
            admin_api_version = %config.admin_api_version,
            dataverse_api_version = %config.dataverse_api_version,
            "environment-settings module initialised"
        );
        Self {
            service: Arc::new(EnvironmentSettingsService::new(executor, config)),
        }
    }

    #[must_use]
    pub fn client(&self) -> Arc<dyn EnvironmentSettingsClient> {
        Arc::new(EnvironmentSettingsLocalClient::new(Arc::clone(&self.service)))
    }
}
