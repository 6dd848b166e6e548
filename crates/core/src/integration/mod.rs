//! Integration connections to external providers.

pub mod ports;
pub mod service;

pub use service::IntegrationService;
