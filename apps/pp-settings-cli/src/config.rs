//! Layered application configuration.
//!
//! Precedence, lowest first: built-in defaults, the YAML file given with
//! `--config`, then `PP_SETTINGS__*` environment variables (`__` separates
//! nesting levels, e.g. `PP_SETTINGS__HTTP__REQUEST_TIMEOUT=10s`).

use std::path::Path;

use environment_settings::EnvironmentSettingsConfig;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use ppkit_http::HttpExecutorConfig;
use serde::{Deserialize, Serialize};

pub const ENV_PREFIX: &str = "PP_SETTINGS__";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub environment_settings: EnvironmentSettingsConfig,
    pub http: HttpExecutorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl AppConfig {
    fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file_exact(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load the effective configuration.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or any layer has an invalid or
    /// unknown key.
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }

    /// Render as YAML for `print-config`.
    ///
    /// # Errors
    ///
    /// Fails if serialization fails.
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_saphyr::to_string(self)?)
    }
}
