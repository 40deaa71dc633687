//! Domain layer for environment settings.

pub mod error;
pub mod local_client;
pub mod service;
mod urls;

#[cfg(test)]
mod service_test;

pub use error::DomainError;
pub use local_client::EnvironmentSettingsLocalClient;
pub use service::EnvironmentSettingsService;
