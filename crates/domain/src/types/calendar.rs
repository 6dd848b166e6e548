//! Calendar, share-grant, and calendar-event types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DaybookError;
use crate::tombstone::Tombstone;

/// Visibility tier governing who may read a calendar and its events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Owner only.
    Private,
    /// Owner plus the calendar's share grantees.
    Shared,
    /// Every authenticated user.
    Public,
}

impl Visibility {
    /// Canonical lowercase form used in storage and at the boundary.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Shared => "shared",
            Self::Public => "public",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = DaybookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "private" => Ok(Self::Private),
            "shared" => Ok(Self::Shared),
            "public" => Ok(Self::Public),
            other => Err(DaybookError::Validation(format!(
                "unknown visibility '{other}'"
            ))),
        }
    }
}

/// A calendar owned by a single user.
///
/// The share list confers read access only; ownership is immutable and is the
/// sole write authority. `shares` is populated when the calendar is loaded as
/// an aggregate and is meaningful only while `visibility` is [`Visibility::Shared`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub visibility: Visibility,
    pub deleted: bool,
    pub shares: Vec<CalendarShare>,
}

impl Calendar {
    /// Whether `user_id` holds a share grant on this calendar.
    pub fn is_shared_with(&self, user_id: &str) -> bool {
        self.shares.iter().any(|s| s.user_id == user_id)
    }
}

impl Tombstone for Calendar {
    fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }
}

/// A share grant: (calendar, user) is the natural key.
///
/// Grants are created and destroyed only as a side effect of calendar
/// visibility/share-list updates. They carry no tombstone flag; removal is
/// physical so a later re-grant never collides with a dead row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarShare {
    pub calendar_id: Uuid,
    pub user_id: String,
}

/// An event belonging to exactly one calendar.
///
/// `calendar_id` is immutable after creation: events never move between
/// calendars. `created_by` records the actor of the original insert and is
/// preserved across upserts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: Uuid,
    pub calendar_id: Uuid,
    pub task_id: Option<Uuid>,
    pub title: String,
    pub location: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub all_day: bool,
    pub provider: Option<String>,
    pub provider_event_id: Option<String>,
    pub created_by: String,
    pub deleted: bool,
}

impl Tombstone for CalendarEvent {
    fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }
}

/// Parameters for creating a calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarDraft {
    /// Identity to use; a new one is assigned when absent.
    pub id: Option<Uuid>,
    pub name: String,
    pub visibility: Visibility,
    /// Requested grantees; only honored when `visibility` is `Shared`.
    pub share_user_ids: Vec<String>,
}

/// Parameters for the idempotent event upsert.
///
/// An absent `id` means "insert under a fresh identity". A present `id` that
/// is unknown to the store inserts under that identity; a known `id` updates
/// the stored event in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDraft {
    pub id: Option<Uuid>,
    pub calendar_id: Uuid,
    pub task_id: Option<Uuid>,
    pub title: String,
    pub location: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub all_day: bool,
    pub provider: Option<String>,
    pub provider_event_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_round_trips_through_str() {
        for v in [Visibility::Private, Visibility::Shared, Visibility::Public] {
            assert_eq!(v.as_str().parse::<Visibility>().unwrap(), v);
        }
    }

    #[test]
    fn visibility_parse_is_case_insensitive() {
        assert_eq!("  Public ".parse::<Visibility>().unwrap(), Visibility::Public);
    }

    #[test]
    fn visibility_parse_rejects_unknown_values() {
        let err = "friends-only".parse::<Visibility>().unwrap_err();
        assert!(matches!(err, DaybookError::Validation(_)));
    }
}
