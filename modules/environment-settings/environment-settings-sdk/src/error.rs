//! Error types for the environment-settings module.

use std::fmt;

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The remote step that was running when an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingsOperation {
    /// Admin API lookup of the environment descriptor
    ResolveEnvironment,
    /// Read of the organization settings collection
    ReadSettings,
    /// Partial update of the organization settings record
    PatchSettings,
}

impl SettingsOperation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ResolveEnvironment => "resolve environment",
            Self::ReadSettings => "read organization settings",
            Self::PatchSettings => "patch organization settings",
        }
    }
}

impl fmt::Display for SettingsOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur when using the environment-settings API.
///
/// Every variant names the environment it concerns; variants tied to a remote
/// call also name the step that failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EnvironmentSettingsError {
    /// The environment exists but has no data service attached.
    #[error("environment {environment_id} has no linked Dataverse instance")]
    EnvironmentNotLinked { environment_id: String },

    /// The linked instance URL could not be turned into a host.
    #[error("environment {environment_id} has an invalid instance url '{url}': {reason}")]
    InvalidInstanceUrl {
        environment_id: String,
        url: String,
        reason: String,
    },

    /// The settings read returned no records.
    #[error("organization settings for environment {environment_id} returned no records")]
    EmptySettingsCollection { environment_id: String },

    /// The settings record carries no organization id, so it cannot be addressed.
    #[error("organization settings for environment {environment_id} carry no organization id")]
    MissingOrganizationId { environment_id: String },

    /// The remote call returned a status outside the acceptable set.
    #[error("{operation} for environment {environment_id} returned HTTP {status}: {body_preview}")]
    UnexpectedStatus {
        operation: SettingsOperation,
        environment_id: String,
        status: u16,
        body_preview: String,
    },

    /// Connection-level or executor failure.
    #[error("{operation} for environment {environment_id} failed: {source}")]
    Transport {
        operation: SettingsOperation,
        environment_id: String,
        #[source]
        source: BoxError,
    },

    /// The response body did not match the expected shape.
    #[error("{operation} for environment {environment_id} returned an undecodable body: {source}")]
    Decode {
        operation: SettingsOperation,
        environment_id: String,
        #[source]
        source: BoxError,
    },

    /// The caller's context was cancelled.
    #[error("{operation} for environment {environment_id} was cancelled")]
    Cancelled {
        operation: SettingsOperation,
        environment_id: String,
    },
}

impl EnvironmentSettingsError {
    /// The environment this error concerns.
    #[must_use]
    pub fn environment_id(&self) -> &str {
        match self {
            Self::EnvironmentNotLinked { environment_id }
            | Self::InvalidInstanceUrl { environment_id, .. }
            | Self::EmptySettingsCollection { environment_id }
            | Self::MissingOrganizationId { environment_id }
            | Self::UnexpectedStatus { environment_id, .. }
            | Self::Transport { environment_id, .. }
            | Self::Decode { environment_id, .. }
            | Self::Cancelled { environment_id, .. } => environment_id,
        }
    }

    /// The remote step that failed, for errors raised by a remote call.
    #[must_use]
    pub fn operation(&self) -> Option<SettingsOperation> {
        match self {
            Self::UnexpectedStatus { operation, .. }
            | Self::Transport { operation, .. }
            | Self::Decode { operation, .. }
            | Self::Cancelled { operation, .. } => Some(*operation),
            Self::EmptySettingsCollection { .. } | Self::MissingOrganizationId { .. } => {
                Some(SettingsOperation::ReadSettings)
            }
            Self::EnvironmentNotLinked { .. } | Self::InvalidInstanceUrl { .. } => None,
        }
    }

    /// HTTP status of an `UnexpectedStatus` error.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_linked(&self) -> bool {
        matches!(self, Self::EnvironmentNotLinked { .. })
    }
}
