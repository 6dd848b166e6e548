//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Daybook
///
/// Errors are categorized, not typed per call site. Policy denials
/// (`NoAccess`, `NotOwner`) are never conflated with `NotFound` at this
/// level; the request layer may choose to map both onto the same transport
/// status so probing callers cannot learn whether a hidden resource exists.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum DaybookError {
    /// Resource absent, or tombstoned under the default read filter.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Actor lacks visibility of the resource.
    #[error("No access: {0}")]
    NoAccess(String),

    /// Actor lacks ownership of the resource.
    #[error("Not owner: {0}")]
    NotOwner(String),

    /// Event/calendar identity mismatch on an event operation.
    #[error("Calendar mismatch: {0}")]
    CalendarMismatch(String),

    /// Uniqueness violation surfaced by the store at commit time.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Malformed input caught before touching the store.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Store-level failure unrelated to a uniqueness constraint.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type alias for Daybook operations
pub type Result<T> = std::result::Result<T, DaybookError>;
