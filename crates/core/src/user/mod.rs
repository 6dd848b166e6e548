//! User-role bookkeeping.

pub mod ports;
pub mod service;

pub use service::UserRoleService;
