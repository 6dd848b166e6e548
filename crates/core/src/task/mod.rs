//! Task lifecycle with ownership-gated mutation.

pub mod ports;
pub mod service;

pub use service::TaskService;
