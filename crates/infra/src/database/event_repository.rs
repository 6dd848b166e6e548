//! SQLite-backed implementation of the calendar-event port.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use daybook_core::calendar::ports::CalendarEventRepository;
use daybook_domain::{CalendarEvent, Result};
use tracing::instrument;
use uuid::Uuid;

use super::manager::DbManager;
use super::store::{self, SoftDeleteStore, SqlArg, WriteBatch};

/// SQLite implementation of [`CalendarEventRepository`].
pub struct SqliteCalendarEventRepository {
    db: Arc<DbManager>,
    events: SoftDeleteStore<CalendarEvent>,
}

impl SqliteCalendarEventRepository {
    /// Create a new event repository.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { events: SoftDeleteStore::new(Arc::clone(&db)), db }
    }
}

#[async_trait]
impl CalendarEventRepository for SqliteCalendarEventRepository {
    async fn get(&self, id: Uuid) -> Result<Option<CalendarEvent>> {
        Ok(self.events.get(id).await?)
    }

    #[instrument(skip(self))]
    async fn in_range(
        &self,
        calendar_id: Uuid,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<CalendarEvent>> {
        // Interval overlap: an event overlaps [start, end] iff
        // end_at >= start and start_at <= end; unbounded sides pass NULL.
        Ok(self
            .events
            .list(
                "calendar_id = ?1
                 AND (?2 IS NULL OR end_at >= ?2)
                 AND (?3 IS NULL OR start_at <= ?3)",
                vec![
                    SqlArg::uuid(calendar_id),
                    SqlArg::timestamp_opt(start),
                    SqlArg::timestamp_opt(end),
                ],
                "start_at, end_at",
            )
            .await?)
    }

    async fn insert(&self, event: &CalendarEvent) -> Result<()> {
        let mut batch = WriteBatch::new();
        self.events.stage_insert(&mut batch, event.clone());
        store::commit(&self.db, batch).await?;
        Ok(())
    }

    async fn update(&self, event: &CalendarEvent) -> Result<()> {
        let mut batch = WriteBatch::new();
        self.events.stage_update(&mut batch, event.clone());
        store::commit(&self.db, batch).await?;
        Ok(())
    }

    async fn remove(&self, event: CalendarEvent) -> Result<()> {
        let mut batch = WriteBatch::new();
        self.events.stage_remove(&mut batch, event);
        store::commit(&self.db, batch).await?;
        Ok(())
    }
}
