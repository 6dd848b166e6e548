//! # Daybook Infra
//!
//! Infrastructure layer - SQLite-backed adapters for the core's ports.
//!
//! This crate contains:
//! - The pooled database manager and schema migrations
//! - The generic soft-delete store (tombstone filtering written once)
//! - One repository per core port
//!
//! ## Architecture
//! - Implements the traits defined in `daybook-core`
//! - Blocking SQLite work runs inside `spawn_blocking`
//! - Error conversions into domain errors stay on this side

pub mod database;
pub mod errors;

pub use database::manager::DbManager;
pub use database::{
    SqliteCalendarEventRepository, SqliteCalendarRepository, SqliteIntegrationRepository,
    SqliteTaskRepository, SqliteUserRoleRepository,
};
