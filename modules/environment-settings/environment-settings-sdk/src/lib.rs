//! Environment Settings SDK
//!
//! This crate provides the public API for the `environment-settings` module:
//!
//! - [`EnvironmentSettingsClient`] - API trait for consumers
//! - [`EnvironmentDescriptor`], [`OrganizationSettings`],
//!   [`OrganizationSettingsPatch`] - models
//! - [`EnvironmentSettingsError`] - error types

pub mod api;
pub mod error;
pub mod models;

pub use api::EnvironmentSettingsClient;
pub use error::{EnvironmentSettingsError, SettingsOperation};
pub use models::{
    EnvironmentDescriptor, LinkedServiceMetadata, OrganizationSettings,
    OrganizationSettingsPatch, PluginTraceLogSetting, SettingsFields,
};
