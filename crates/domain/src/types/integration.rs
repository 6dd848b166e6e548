//! Integration connection types (external calendar/task providers).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tombstone::Tombstone;

/// A connection to an external provider, at most one live per
/// (provider, owner) pair.
///
/// Disconnecting tombstones the record; reconnecting resurrects the same
/// logical record (clearing the tombstone and overwriting credential fields)
/// rather than inserting a duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationConnection {
    pub id: Uuid,
    pub owner_id: String,
    /// Canonical lowercase provider name, e.g. "google" or "outlook".
    pub provider: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub connected_at: DateTime<Utc>,
    pub deleted: bool,
}

impl Tombstone for IntegrationConnection {
    fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }
}

/// Credential material supplied when connecting a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionDraft {
    pub provider: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}
