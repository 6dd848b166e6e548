//! SQLite-backed implementation of the calendar ports.

use std::sync::Arc;

use async_trait::async_trait;
use daybook_core::calendar::ports::CalendarRepository;
use daybook_domain::{Calendar, CalendarShare, Result};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::manager::DbManager;
use super::store::{self, SoftDeleteStore, SqlArg, WriteBatch};

/// Visibility filter shared with `list_visible_to`: owned, public, or
/// granted through the share table.
const VISIBLE_SQL: &str = "owner_id = ?1
    OR visibility = 'public'
    OR (visibility = 'shared' AND id IN
        (SELECT calendar_id FROM calendar_shares WHERE user_id = ?1))";

/// SQLite implementation of [`CalendarRepository`].
///
/// A calendar is an aggregate of its row and its share grants; every write
/// that touches both goes through one committed batch.
pub struct SqliteCalendarRepository {
    db: Arc<DbManager>,
    calendars: SoftDeleteStore<Calendar>,
    shares: SoftDeleteStore<CalendarShare>,
}

impl SqliteCalendarRepository {
    /// Create a new calendar repository.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self {
            calendars: SoftDeleteStore::new(Arc::clone(&db)),
            shares: SoftDeleteStore::new(Arc::clone(&db)),
            db,
        }
    }

    async fn load_shares(&self, calendar_id: Uuid) -> Result<Vec<CalendarShare>> {
        Ok(self
            .shares
            .list("calendar_id = ?1", vec![SqlArg::uuid(calendar_id)], "user_id")
            .await?)
    }

    async fn assemble(&self, calendar: Option<Calendar>) -> Result<Option<Calendar>> {
        match calendar {
            Some(mut calendar) => {
                calendar.shares = self.load_shares(calendar.id).await?;
                Ok(Some(calendar))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl CalendarRepository for SqliteCalendarRepository {
    #[instrument(skip(self))]
    async fn list_visible_to(&self, user_id: &str) -> Result<Vec<Calendar>> {
        let rows = self
            .calendars
            .list(VISIBLE_SQL, vec![SqlArg::text(user_id)], "name")
            .await?;

        let mut calendars = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(calendar) = self.assemble(Some(row)).await? {
                calendars.push(calendar);
            }
        }

        debug!(user_id, count = calendars.len(), "listed visible calendars");
        Ok(calendars)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Calendar>> {
        let row = self.calendars.get(id).await?;
        self.assemble(row).await
    }

    async fn get_any(&self, id: Uuid) -> Result<Option<Calendar>> {
        let row = self.calendars.get_ignoring_tombstone(id).await?;
        self.assemble(row).await
    }

    #[instrument(skip(self, calendar), fields(calendar_id = %calendar.id))]
    async fn insert(&self, calendar: &Calendar) -> Result<()> {
        let mut batch = WriteBatch::new();
        self.calendars.stage_insert(&mut batch, calendar.clone());
        for share in &calendar.shares {
            self.shares.stage_insert(&mut batch, share.clone());
        }

        store::commit(&self.db, batch).await?;
        Ok(())
    }

    #[instrument(skip(self, calendar), fields(calendar_id = %calendar.id))]
    async fn update(&self, calendar: &Calendar) -> Result<()> {
        let mut batch = WriteBatch::new();
        self.calendars.stage_update(&mut batch, calendar.clone());
        // Whole-set replacement of the grants, in the same transaction.
        batch.push_sql(
            "DELETE FROM calendar_shares WHERE calendar_id = ?1",
            vec![SqlArg::uuid(calendar.id)],
        );
        for share in &calendar.shares {
            self.shares.stage_insert(&mut batch, share.clone());
        }

        store::commit(&self.db, batch).await?;
        Ok(())
    }

    #[instrument(skip(self, calendar), fields(calendar_id = %calendar.id))]
    async fn delete(&self, calendar: &Calendar) -> Result<()> {
        let mut batch = WriteBatch::new();
        self.calendars.stage_remove(&mut batch, calendar.clone());
        // Cascade: events are tombstoned, grants removed for good.
        batch.push_sql(
            "UPDATE calendar_events SET deleted = 1 WHERE calendar_id = ?1",
            vec![SqlArg::uuid(calendar.id)],
        );
        batch.push_sql(
            "DELETE FROM calendar_shares WHERE calendar_id = ?1",
            vec![SqlArg::uuid(calendar.id)],
        );

        let affected = store::commit(&self.db, batch).await?;
        debug!(calendar_id = %calendar.id, affected, "calendar tombstoned with cascade");
        Ok(())
    }
}
