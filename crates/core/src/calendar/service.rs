//! Calendar service - core business logic
//!
//! Orchestrates the access-control policy and the calendar/event ports.
//! Access is re-checked on every mutating call; nothing caches an earlier
//! authorization decision.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use daybook_domain::{
    Calendar, CalendarDraft, CalendarEvent, CalendarShare, DaybookError, EventDraft, Result,
    Tombstone, Visibility,
};
use tracing::debug;
use uuid::Uuid;

use super::ports::{CalendarEventRepository, CalendarRepository};
use crate::policy::{self, Actor};

/// Calendar lifecycle and calendar-scoped event service.
pub struct CalendarService {
    calendars: Arc<dyn CalendarRepository>,
    events: Arc<dyn CalendarEventRepository>,
}

impl CalendarService {
    /// Create a new calendar service.
    pub fn new(
        calendars: Arc<dyn CalendarRepository>,
        events: Arc<dyn CalendarEventRepository>,
    ) -> Self {
        Self { calendars, events }
    }

    /// Calendars the actor may read: owned, public, or granted. Ordered by
    /// name.
    pub async fn list_for_user(&self, actor: &Actor) -> Result<Vec<Calendar>> {
        self.calendars.list_visible_to(&actor.user_id).await
    }

    /// Create a calendar owned by the actor.
    ///
    /// Share grants are built only for `Shared` visibility; any other
    /// visibility yields an empty grant set regardless of what was requested.
    pub async fn create(&self, actor: &Actor, draft: CalendarDraft) -> Result<Calendar> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(DaybookError::Validation("calendar name must not be empty".into()));
        }

        let id = draft.id.unwrap_or_else(Uuid::now_v7);
        let shares =
            build_share_set(id, &actor.user_id, draft.visibility, &draft.share_user_ids)?;

        let calendar = Calendar {
            id,
            owner_id: actor.user_id.clone(),
            name: name.to_string(),
            visibility: draft.visibility,
            deleted: false,
            shares,
        };

        self.calendars.insert(&calendar).await?;
        debug!(calendar_id = %calendar.id, owner = %calendar.owner_id, "calendar created");
        Ok(calendar)
    }

    /// Rename a calendar, change its visibility, and replace its share set.
    ///
    /// Loads ignoring the tombstone filter so an already-deleted calendar
    /// yields a clear not-found rather than a false denial.
    pub async fn update(
        &self,
        calendar_id: Uuid,
        actor: &Actor,
        draft: CalendarDraft,
    ) -> Result<Calendar> {
        let mut calendar = self.load_for_owner(calendar_id, actor).await?;

        let name = draft.name.trim();
        if name.is_empty() {
            return Err(DaybookError::Validation("calendar name must not be empty".into()));
        }

        calendar.name = name.to_string();
        calendar.visibility = draft.visibility;
        // Whole-set replacement: transitions away from Shared clear the
        // grants, they are not merely ignored.
        calendar.shares = build_share_set(
            calendar.id,
            &calendar.owner_id,
            draft.visibility,
            &draft.share_user_ids,
        )?;

        self.calendars.update(&calendar).await?;
        debug!(calendar_id = %calendar.id, visibility = %calendar.visibility, "calendar updated");
        Ok(calendar)
    }

    /// Tombstone a calendar. Cascading tombstone of its events and removal
    /// of its share grants happen at the storage layer in the same commit.
    pub async fn delete(&self, calendar_id: Uuid, actor: &Actor) -> Result<()> {
        let calendar = self.load_for_owner(calendar_id, actor).await?;
        self.calendars.delete(&calendar).await?;
        debug!(calendar_id = %calendar.id, "calendar deleted");
        Ok(())
    }

    /// Events of a calendar overlapping [start, end], ordered by
    /// (start, end) ascending.
    pub async fn get_events(
        &self,
        calendar_id: Uuid,
        actor: &Actor,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<CalendarEvent>> {
        let calendar = self.load_visible(calendar_id, actor).await?;
        self.events.in_range(calendar.id, start, end).await
    }

    /// Idempotent event upsert keyed by event identity.
    ///
    /// A new identity is inserted with the actor recorded as creator; an
    /// existing identity has its mutable fields overwritten in place with
    /// identity and creator preserved. Retargeting an event to a different
    /// calendar is a [`DaybookError::CalendarMismatch`], not a silent move.
    pub async fn upsert_event(&self, actor: &Actor, draft: EventDraft) -> Result<CalendarEvent> {
        // Visibility of the parent calendar gates every event mutation.
        let calendar = self.load_visible(draft.calendar_id, actor).await?;
        validate_event_fields(&draft)?;

        let existing = match draft.id {
            Some(id) if !id.is_nil() => self.events.get(id).await?,
            _ => None,
        };

        match existing {
            Some(mut stored) => {
                if stored.calendar_id != draft.calendar_id {
                    return Err(DaybookError::CalendarMismatch(format!(
                        "event {} belongs to calendar {}",
                        stored.id, stored.calendar_id
                    )));
                }

                stored.task_id = draft.task_id;
                stored.title = draft.title.trim().to_string();
                stored.location = draft.location;
                stored.start_at = draft.start_at;
                stored.end_at = draft.end_at;
                stored.all_day = draft.all_day;
                stored.provider = draft.provider;
                stored.provider_event_id = draft.provider_event_id;

                self.events.update(&stored).await?;
                debug!(event_id = %stored.id, calendar_id = %calendar.id, "event updated");
                Ok(stored)
            }
            None => {
                // A tombstoned identity also lands here: the row still holds
                // the primary key, so the insert is rejected as a conflict.
                // Deleted events stay deleted.
                let event = CalendarEvent {
                    id: draft.id.filter(|id| !id.is_nil()).unwrap_or_else(Uuid::now_v7),
                    calendar_id: calendar.id,
                    task_id: draft.task_id,
                    title: draft.title.trim().to_string(),
                    location: draft.location,
                    start_at: draft.start_at,
                    end_at: draft.end_at,
                    all_day: draft.all_day,
                    provider: draft.provider,
                    provider_event_id: draft.provider_event_id,
                    created_by: actor.user_id.clone(),
                    deleted: false,
                };

                self.events.insert(&event).await?;
                debug!(event_id = %event.id, calendar_id = %calendar.id, "event created");
                Ok(event)
            }
        }
    }

    /// Tombstone an event after verifying it belongs to `calendar_id`.
    pub async fn delete_event(
        &self,
        calendar_id: Uuid,
        event_id: Uuid,
        actor: &Actor,
    ) -> Result<()> {
        self.load_visible(calendar_id, actor).await?;

        let event = self
            .events
            .get(event_id)
            .await?
            .ok_or_else(|| DaybookError::NotFound(format!("event {event_id}")))?;

        if event.calendar_id != calendar_id {
            return Err(DaybookError::CalendarMismatch(format!(
                "event {event_id} belongs to calendar {}",
                event.calendar_id
            )));
        }

        let id = event.id;
        self.events.remove(event).await?;
        debug!(event_id = %id, calendar_id = %calendar_id, "event deleted");
        Ok(())
    }

    /// Owner-gated load for mutation, via the tombstone bypass: a tombstoned
    /// calendar reads as not-found, never as a denial.
    async fn load_for_owner(&self, calendar_id: Uuid, actor: &Actor) -> Result<Calendar> {
        let calendar = self
            .calendars
            .get_any(calendar_id)
            .await?
            .filter(|c| !c.is_deleted())
            .ok_or_else(|| DaybookError::NotFound(format!("calendar {calendar_id}")))?;

        policy::calendar_owner_only(&calendar, actor).require("calendar")?;
        Ok(calendar)
    }

    /// Visibility-gated load for reads and event operations.
    async fn load_visible(&self, calendar_id: Uuid, actor: &Actor) -> Result<Calendar> {
        let calendar = self
            .calendars
            .get(calendar_id)
            .await?
            .ok_or_else(|| DaybookError::NotFound(format!("calendar {calendar_id}")))?;

        policy::calendar_visible_to(&calendar, actor).require("calendar")?;
        Ok(calendar)
    }
}

fn validate_event_fields(draft: &EventDraft) -> Result<()> {
    if draft.title.trim().is_empty() {
        return Err(DaybookError::Validation("event title must not be empty".into()));
    }
    if draft.start_at >= draft.end_at {
        return Err(DaybookError::Validation("event start must precede its end".into()));
    }
    Ok(())
}

/// Build the share-grant set for a visibility value.
///
/// Grants exist only for `Shared`: duplicates, blank identifiers, and
/// self-grants are dropped, and at least one grantee must remain.
fn build_share_set(
    calendar_id: Uuid,
    owner_id: &str,
    visibility: Visibility,
    requested: &[String],
) -> Result<Vec<CalendarShare>> {
    if visibility != Visibility::Shared {
        return Ok(Vec::new());
    }

    let grantees: BTreeSet<&str> = requested
        .iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty() && *u != owner_id)
        .collect();

    if grantees.is_empty() {
        return Err(DaybookError::Validation(
            "a shared calendar requires at least one grantee".into(),
        ));
    }

    Ok(grantees
        .into_iter()
        .map(|user_id| CalendarShare { calendar_id, user_id: user_id.to_string() })
        .collect())
}
