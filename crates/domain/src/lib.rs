//! # Daybook Domain
//!
//! Business domain types and models for the Daybook scheduling core.
//!
//! This crate contains:
//! - Domain data types (Calendar, CalendarEvent, Task, IntegrationConnection)
//! - Domain error types and Result definitions
//! - The `Tombstone` soft-delete capability trait
//! - Draft/patch parameter structs used by the service layer
//!
//! ## Architecture
//! - No dependencies on other Daybook crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod errors;
pub mod tombstone;
pub mod types;

// Re-export commonly used items
pub use errors::*;
pub use tombstone::Tombstone;
pub use types::*;
