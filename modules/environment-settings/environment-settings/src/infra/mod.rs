//! Infrastructure layer: wire shapes of the admin and data-service APIs.

pub mod dto;
