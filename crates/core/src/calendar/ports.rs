//! Port interfaces for calendar persistence
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations. All default reads hide tombstoned
//! rows; the `_any` variants bypass the filter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use daybook_domain::{Calendar, CalendarEvent, Result};
use uuid::Uuid;

/// Calendar aggregate persistence (calendar row plus its share grants).
#[async_trait]
pub trait CalendarRepository: Send + Sync {
    /// Calendars visible to `user_id` (owned, public, or granted), ordered
    /// by name for stable presentation.
    async fn list_visible_to(&self, user_id: &str) -> Result<Vec<Calendar>>;

    /// Load a live calendar with its share grants.
    async fn get(&self, id: Uuid) -> Result<Option<Calendar>>;

    /// Load a calendar regardless of its tombstone flag.
    async fn get_any(&self, id: Uuid) -> Result<Option<Calendar>>;

    /// Insert a calendar together with its share grants, atomically.
    async fn insert(&self, calendar: &Calendar) -> Result<()>;

    /// Update the calendar row and replace its entire share-grant set,
    /// atomically. The share set is rebuilt whole, never diffed.
    async fn update(&self, calendar: &Calendar) -> Result<()>;

    /// Tombstone the calendar, cascading: its events are tombstoned and its
    /// share grants deleted in the same commit.
    async fn delete(&self, calendar: &Calendar) -> Result<()>;
}

/// Calendar event persistence.
#[async_trait]
pub trait CalendarEventRepository: Send + Sync {
    /// Load a live event.
    async fn get(&self, id: Uuid) -> Result<Option<CalendarEvent>>;

    /// Live events of a calendar whose interval overlaps [start, end]
    /// (an event overlaps if `end_at >= start` and `start_at <= end`);
    /// unbounded sides are open. Ordered by (start_at, end_at) ascending.
    async fn in_range(
        &self,
        calendar_id: Uuid,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<CalendarEvent>>;

    /// Insert a new event.
    async fn insert(&self, event: &CalendarEvent) -> Result<()>;

    /// Overwrite an existing event's mutable fields.
    async fn update(&self, event: &CalendarEvent) -> Result<()>;

    /// Tombstone an event.
    async fn remove(&self, event: CalendarEvent) -> Result<()>;
}
