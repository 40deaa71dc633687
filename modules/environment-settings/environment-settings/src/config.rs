//! Configuration for the environment-settings module.

use serde::{Deserialize, Serialize};

/// Module configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvironmentSettingsConfig {
    /// Host of the admin (BAPI) environment directory.
    pub bapi_host: String,

    /// `api-version` query value sent to the admin API.
    pub admin_api_version: String,

    /// Web API version segment of data-service URLs (`/api/data/{version}/...`).
    pub dataverse_api_version: String,
}

impl Default for EnvironmentSettingsConfig {
    fn default() -> Self {
        Self {
            bapi_host: "api.bap.microsoft.com".to_owned(),
            admin_api_version: "2023-06-01".to_owned(),
            dataverse_api_version: "v9.0".to_owned(),
        }
    }
}
