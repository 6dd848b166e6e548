//! [`Record`] implementations binding domain entities to their tables.
//!
//! Column lists and `from_row` index order must stay in sync; instants are
//! stored as unix-epoch seconds, uuids as TEXT, booleans as INTEGER.

use chrono::{DateTime, Utc};
use daybook_domain::{
    Calendar, CalendarEvent, CalendarShare, IntegrationConnection, Task, TaskPriority,
    TaskStatus, Visibility,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::store::Record;

fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(idx)?;
    Uuid::parse_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn uuid_opt_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| {
        Uuid::parse_str(&t)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn instant_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let secs: i64 = row.get(idx)?;
    DateTime::from_timestamp(secs, 0).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            "timestamp out of range".into(),
        )
    })
}

fn instant_opt_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let secs: Option<i64> = row.get(idx)?;
    secs.map(|s| {
        DateTime::from_timestamp(s, 0).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                Type::Integer,
                "timestamp out of range".into(),
            )
        })
    })
    .transpose()
}

fn parse_at<T>(idx: usize, text: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    text.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl Record for Calendar {
    const TABLE: &'static str = "calendars";
    const COLUMNS: &'static str = "id, owner_id, name, visibility, deleted";
    const SOFT_DELETE: bool = true;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let visibility: String = row.get(3)?;
        Ok(Self {
            id: uuid_at(row, 0)?,
            owner_id: row.get(1)?,
            name: row.get(2)?,
            visibility: parse_at::<Visibility>(3, &visibility)?,
            deleted: row.get(4)?,
            // Grants live in their own table; the repository assembles them.
            shares: Vec::new(),
        })
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO calendars (id, owner_id, name, visibility, deleted)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.id.to_string(),
                self.owner_id,
                self.name,
                self.visibility.as_str(),
                self.deleted
            ],
        )
    }

    fn update(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "UPDATE calendars SET name = ?2, visibility = ?3, deleted = ?4 WHERE id = ?1",
            params![
                self.id.to_string(),
                self.name,
                self.visibility.as_str(),
                self.deleted
            ],
        )
    }

    fn mark_deleted(&mut self) {
        self.deleted = true;
    }
}

impl Record for CalendarShare {
    const TABLE: &'static str = "calendar_shares";
    const COLUMNS: &'static str = "calendar_id, user_id";
    const SOFT_DELETE: bool = false;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self { calendar_id: uuid_at(row, 0)?, user_id: row.get(1)? })
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO calendar_shares (calendar_id, user_id) VALUES (?1, ?2)",
            params![self.calendar_id.to_string(), self.user_id],
        )
    }

    fn update(&self, _conn: &Connection) -> rusqlite::Result<usize> {
        // Grants are immutable; they are replaced, never edited.
        Ok(0)
    }

    fn delete(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "DELETE FROM calendar_shares WHERE calendar_id = ?1 AND user_id = ?2",
            params![self.calendar_id.to_string(), self.user_id],
        )
    }
}

impl Record for CalendarEvent {
    const TABLE: &'static str = "calendar_events";
    const COLUMNS: &'static str = "id, calendar_id, task_id, title, location, start_at, end_at, \
                                   all_day, provider, provider_event_id, created_by, deleted";
    const SOFT_DELETE: bool = true;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: uuid_at(row, 0)?,
            calendar_id: uuid_at(row, 1)?,
            task_id: uuid_opt_at(row, 2)?,
            title: row.get(3)?,
            location: row.get(4)?,
            start_at: instant_at(row, 5)?,
            end_at: instant_at(row, 6)?,
            all_day: row.get(7)?,
            provider: row.get(8)?,
            provider_event_id: row.get(9)?,
            created_by: row.get(10)?,
            deleted: row.get(11)?,
        })
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO calendar_events (
                id, calendar_id, task_id, title, location, start_at, end_at,
                all_day, provider, provider_event_id, created_by, deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                self.id.to_string(),
                self.calendar_id.to_string(),
                self.task_id.map(|id| id.to_string()),
                self.title,
                self.location,
                self.start_at.timestamp(),
                self.end_at.timestamp(),
                self.all_day,
                self.provider,
                self.provider_event_id,
                self.created_by,
                self.deleted
            ],
        )
    }

    fn update(&self, conn: &Connection) -> rusqlite::Result<usize> {
        // calendar_id and created_by are immutable and deliberately absent.
        conn.execute(
            "UPDATE calendar_events SET
                task_id = ?2, title = ?3, location = ?4, start_at = ?5, end_at = ?6,
                all_day = ?7, provider = ?8, provider_event_id = ?9, deleted = ?10
             WHERE id = ?1",
            params![
                self.id.to_string(),
                self.task_id.map(|id| id.to_string()),
                self.title,
                self.location,
                self.start_at.timestamp(),
                self.end_at.timestamp(),
                self.all_day,
                self.provider,
                self.provider_event_id,
                self.deleted
            ],
        )
    }

    fn mark_deleted(&mut self) {
        self.deleted = true;
    }
}

impl Record for Task {
    const TABLE: &'static str = "tasks";
    const COLUMNS: &'static str = "id, project_id, owner_id, title, description, status, \
                                   priority, assignee, due_at, completed_at, created_at, deleted";
    const SOFT_DELETE: bool = true;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let status: String = row.get(5)?;
        let priority: String = row.get(6)?;
        Ok(Self {
            id: uuid_at(row, 0)?,
            project_id: uuid_opt_at(row, 1)?,
            owner_id: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            status: parse_at::<TaskStatus>(5, &status)?,
            priority: parse_at::<TaskPriority>(6, &priority)?,
            assignee: row.get(7)?,
            due_at: instant_opt_at(row, 8)?,
            completed_at: instant_opt_at(row, 9)?,
            created_at: instant_at(row, 10)?,
            deleted: row.get(11)?,
        })
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO tasks (
                id, project_id, owner_id, title, description, status, priority,
                assignee, due_at, completed_at, created_at, deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                self.id.to_string(),
                self.project_id.map(|id| id.to_string()),
                self.owner_id,
                self.title,
                self.description,
                self.status.as_str(),
                self.priority.as_str(),
                self.assignee,
                self.due_at.map(|t| t.timestamp()),
                self.completed_at.map(|t| t.timestamp()),
                self.created_at.timestamp(),
                self.deleted
            ],
        )
    }

    fn update(&self, conn: &Connection) -> rusqlite::Result<usize> {
        // owner_id and created_at are immutable and deliberately absent.
        conn.execute(
            "UPDATE tasks SET
                project_id = ?2, title = ?3, description = ?4, status = ?5,
                priority = ?6, assignee = ?7, due_at = ?8, completed_at = ?9,
                deleted = ?10
             WHERE id = ?1",
            params![
                self.id.to_string(),
                self.project_id.map(|id| id.to_string()),
                self.title,
                self.description,
                self.status.as_str(),
                self.priority.as_str(),
                self.assignee,
                self.due_at.map(|t| t.timestamp()),
                self.completed_at.map(|t| t.timestamp()),
                self.deleted
            ],
        )
    }

    fn mark_deleted(&mut self) {
        self.deleted = true;
    }
}

impl Record for IntegrationConnection {
    const TABLE: &'static str = "integration_connections";
    const COLUMNS: &'static str = "id, owner_id, provider, access_token, refresh_token, \
                                   expires_at, connected_at, deleted";
    const SOFT_DELETE: bool = true;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: uuid_at(row, 0)?,
            owner_id: row.get(1)?,
            provider: row.get(2)?,
            access_token: row.get(3)?,
            refresh_token: row.get(4)?,
            expires_at: instant_opt_at(row, 5)?,
            connected_at: instant_at(row, 6)?,
            deleted: row.get(7)?,
        })
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO integration_connections (
                id, owner_id, provider, access_token, refresh_token,
                expires_at, connected_at, deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                self.id.to_string(),
                self.owner_id,
                self.provider,
                self.access_token,
                self.refresh_token,
                self.expires_at.map(|t| t.timestamp()),
                self.connected_at.timestamp(),
                self.deleted
            ],
        )
    }

    fn update(&self, conn: &Connection) -> rusqlite::Result<usize> {
        // owner_id and provider form the natural key and never change.
        conn.execute(
            "UPDATE integration_connections SET
                access_token = ?2, refresh_token = ?3, expires_at = ?4,
                connected_at = ?5, deleted = ?6
             WHERE id = ?1",
            params![
                self.id.to_string(),
                self.access_token,
                self.refresh_token,
                self.expires_at.map(|t| t.timestamp()),
                self.connected_at.timestamp(),
                self.deleted
            ],
        )
    }

    fn mark_deleted(&mut self) {
        self.deleted = true;
    }
}
