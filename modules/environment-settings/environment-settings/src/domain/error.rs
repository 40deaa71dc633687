//! Domain error types for the environment-settings module.

use environment_settings_sdk::{EnvironmentSettingsError, SettingsOperation};
use ppkit_http::HttpError;
use thiserror::Error;

/// Domain-level errors.
///
/// Keeps the concrete executor, decoder and URL errors; they are folded into
/// [`EnvironmentSettingsError`] at the client boundary.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("environment {environment_id} has no linked Dataverse instance")]
    NotLinked { environment_id: String },

    #[error("environment {environment_id} has an invalid instance url '{url}': {source}")]
    InvalidInstanceUrl {
        environment_id: String,
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("organization settings for environment {environment_id} returned no records")]
    EmptySettingsCollection { environment_id: String },

    #[error("organization settings for environment {environment_id} carry no organization id")]
    MissingOrganizationId { environment_id: String },

    /// A request URL could not be built (bad configured host, for instance).
    #[error("{operation} for environment {environment_id}: cannot build request url: {source}")]
    RequestUrl {
        operation: SettingsOperation,
        environment_id: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{operation} for environment {environment_id} failed: {source}")]
    Http {
        operation: SettingsOperation,
        environment_id: String,
        #[source]
        source: HttpError,
    },

    #[error("{operation} for environment {environment_id} returned an undecodable body: {source}")]
    Decode {
        operation: SettingsOperation,
        environment_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{operation} for environment {environment_id} was cancelled")]
    Cancelled {
        operation: SettingsOperation,
        environment_id: String,
    },
}

impl DomainError {
    pub(crate) fn not_linked(environment_id: &str) -> Self {
        Self::NotLinked {
            environment_id: environment_id.to_owned(),
        }
    }

    pub(crate) fn cancelled(operation: SettingsOperation, environment_id: &str) -> Self {
        Self::Cancelled {
            operation,
            environment_id: environment_id.to_owned(),
        }
    }
}

impl From<DomainError> for EnvironmentSettingsError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotLinked { environment_id } => {
                Self::EnvironmentNotLinked { environment_id }
            }
            DomainError::InvalidInstanceUrl {
                environment_id,
                url,
                source,
            } => Self::InvalidInstanceUrl {
                environment_id,
                url,
                reason: source.to_string(),
            },
            DomainError::EmptySettingsCollection { environment_id } => {
                Self::EmptySettingsCollection { environment_id }
            }
            DomainError::MissingOrganizationId { environment_id } => {
                Self::MissingOrganizationId { environment_id }
            }
            DomainError::RequestUrl {
                operation,
                environment_id,
                source,
            } => Self::Transport {
                operation,
                environment_id,
                source: Box::new(source),
            },
            DomainError::Http {
                operation,
                environment_id,
                source,
            } => match source {
                HttpError::Cancelled => Self::Cancelled {
                    operation,
                    environment_id,
                },
                HttpError::UnexpectedStatus {
                    status,
                    body_preview,
                    ..
                } => Self::UnexpectedStatus {
                    operation,
                    environment_id,
                    status: status.as_u16(),
                    body_preview,
                },
                other => Self::Transport {
                    operation,
                    environment_id,
                    source: Box::new(other),
                },
            },
            DomainError::Decode {
                operation,
                environment_id,
                source,
            } => Self::Decode {
                operation,
                environment_id,
                source: Box::new(source),
            },
            DomainError::Cancelled {
                operation,
                environment_id,
            } => Self::Cancelled {
                operation,
                environment_id,
            },
        }
    }
}
