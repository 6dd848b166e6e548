//! Generic soft-delete store.
//!
//! The tombstone filter is written once here and composed into every read;
//! no repository builds its own `deleted = 0` clause. Writes are staged into
//! a [`WriteBatch`] and flushed by [`commit`] in a single transaction, so
//! related inserts (a calendar and its share grants, a tombstone and its
//! cascade) are atomic. `remove` dispatches on the record's capability:
//! tombstone-capable records are updated in place, others are physically
//! deleted, and call sites are identical either way.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::types::{ToSqlOutput, Value};
use rusqlite::{params_from_iter, Connection, Row, ToSql};
use thiserror::Error;
use tokio::task;
use tracing::debug;
use uuid::Uuid;

use super::manager::DbManager;

/// Errors surfaced by the store layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `commit` was called with an empty batch. Distinct from a rejected
    /// write so callers can tell "nothing was dirty" apart from a failure.
    #[error("nothing to persist")]
    NothingToPersist,

    /// A uniqueness constraint rejected the write at commit time.
    #[error("unique constraint violation: {0}")]
    Conflict(String),

    #[error("database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("database error: {0}")]
    Sql(rusqlite::Error),

    #[error("blocking task failed: {0}")]
    Join(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        // SQLITE_CONSTRAINT_UNIQUE (2067) and SQLITE_CONSTRAINT_PRIMARYKEY
        // (1555) are the natural-key rejections the design relies on.
        if let rusqlite::Error::SqliteFailure(code, ref message) = err {
            if matches!(code.extended_code, 2067 | 1555) {
                return Self::Conflict(
                    message
                        .clone()
                        .unwrap_or_else(|| "unique constraint violation".to_string()),
                );
            }
        }
        Self::Sql(err)
    }
}

/// Store result type.
pub type StoreResult<T> = Result<T, StoreError>;

/// Owned SQL parameter, safe to move into `spawn_blocking` closures.
#[derive(Debug, Clone)]
pub enum SqlArg {
    Text(String),
    Int(i64),
    Null,
}

impl SqlArg {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn uuid(value: Uuid) -> Self {
        Self::Text(value.to_string())
    }

    /// Optional instant, stored as unix-epoch seconds.
    pub fn timestamp_opt(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(Self::Null, |v| Self::Int(v.timestamp()))
    }
}

impl ToSql for SqlArg {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Self::Text(value) => value.to_sql(),
            Self::Int(value) => value.to_sql(),
            Self::Null => Ok(ToSqlOutput::Owned(Value::Null)),
        }
    }
}

/// A record type the store can persist.
///
/// Each implementation binds one entity to one table: the select column
/// list, row mapping, and insert/update/delete statements. `SOFT_DELETE`
/// declares the tombstone capability the store dispatches on.
pub trait Record: Clone + Send + Sync + 'static {
    /// Table name.
    const TABLE: &'static str;

    /// Comma-separated select list matching `from_row`'s column order.
    const COLUMNS: &'static str;

    /// Whether the table carries a `deleted` tombstone column. When false,
    /// `remove` deletes physically.
    const SOFT_DELETE: bool;

    /// Map a row in `COLUMNS` order.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Insert statement for this record.
    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize>;

    /// Full-row update statement keyed by identity.
    fn update(&self, conn: &Connection) -> rusqlite::Result<usize>;

    /// Physical delete keyed by the record's natural or surrogate key.
    /// Only invoked when `SOFT_DELETE` is false; tombstone-capable records
    /// keep the no-op default.
    fn delete(&self, _conn: &Connection) -> rusqlite::Result<usize> {
        Ok(0)
    }

    /// Set the tombstone flag. Only invoked when `SOFT_DELETE` is true;
    /// hard-deleted records keep the no-op default.
    fn mark_deleted(&mut self) {}
}

type BatchOp = Box<dyn FnOnce(&Connection) -> rusqlite::Result<usize> + Send>;

/// Staged write operations, possibly spanning several record types, flushed
/// atomically by [`commit`].
#[derive(Default)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Stage a raw statement, e.g. a storage-layer cascade.
    pub fn push_sql(&mut self, sql: &'static str, args: Vec<SqlArg>) {
        self.ops.push(Box::new(move |conn| conn.execute(sql, params_from_iter(args.iter()))));
    }

    fn push_op(&mut self, op: BatchOp) {
        self.ops.push(op);
    }
}

/// Generic persistence wrapper for one record type.
///
/// Reads hide tombstoned rows by default; the `_ignoring_tombstone`
/// variants are the escape hatch for flows that must see them (integration
/// reconnect, owner-gated lookups before an update/delete decision).
pub struct SoftDeleteStore<T: Record> {
    db: Arc<DbManager>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> SoftDeleteStore<T> {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db, _record: PhantomData }
    }

    /// Fetch by id; tombstoned rows read as absent.
    pub async fn get(&self, id: Uuid) -> StoreResult<Option<T>> {
        self.find_inner("id = ?1", vec![SqlArg::uuid(id)], true).await
    }

    /// Fetch by id regardless of the tombstone flag.
    pub async fn get_ignoring_tombstone(&self, id: Uuid) -> StoreResult<Option<T>> {
        self.find_inner("id = ?1", vec![SqlArg::uuid(id)], false).await
    }

    /// First row matching `where_sql`, tombstoned or not.
    pub async fn find_ignoring_tombstone(
        &self,
        where_sql: &'static str,
        args: Vec<SqlArg>,
    ) -> StoreResult<Option<T>> {
        self.find_inner(where_sql, args, false).await
    }

    /// Live rows matching `where_sql`, ordered by `order_by`. The tombstone
    /// filter is appended here; callers never write it themselves.
    pub async fn list(
        &self,
        where_sql: &'static str,
        args: Vec<SqlArg>,
        order_by: &'static str,
    ) -> StoreResult<Vec<T>> {
        let db = Arc::clone(&self.db);
        let sql = format!(
            "SELECT {} FROM {} WHERE ({}){} ORDER BY {}",
            T::COLUMNS,
            T::TABLE,
            where_sql,
            tombstone_clause::<T>(true),
            order_by,
        );

        task::spawn_blocking(move || -> StoreResult<Vec<T>> {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(args.iter()), |row| T::from_row(row))?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
        .await
        .map_err(|e| StoreError::Join(e.to_string()))?
    }

    /// Stage an insert. Never commits by itself; commit is a separate
    /// explicit step so related inserts can be batched atomically.
    pub fn stage_insert(&self, batch: &mut WriteBatch, entity: T) {
        batch.push_op(Box::new(move |conn| entity.insert(conn)));
    }

    /// Stage a full-row update.
    pub fn stage_update(&self, batch: &mut WriteBatch, entity: T) {
        batch.push_op(Box::new(move |conn| entity.update(conn)));
    }

    /// Stage a removal: a tombstone update for capable records, a physical
    /// delete otherwise.
    pub fn stage_remove(&self, batch: &mut WriteBatch, mut entity: T) {
        if T::SOFT_DELETE {
            entity.mark_deleted();
            batch.push_op(Box::new(move |conn| entity.update(conn)));
        } else {
            batch.push_op(Box::new(move |conn| entity.delete(conn)));
        }
    }

    async fn find_inner(
        &self,
        where_sql: &'static str,
        args: Vec<SqlArg>,
        hide_tombstoned: bool,
    ) -> StoreResult<Option<T>> {
        let db = Arc::clone(&self.db);
        let sql = format!(
            "SELECT {} FROM {} WHERE ({}){} LIMIT 1",
            T::COLUMNS,
            T::TABLE,
            where_sql,
            tombstone_clause::<T>(hide_tombstoned),
        );

        task::spawn_blocking(move || -> StoreResult<Option<T>> {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query_map(params_from_iter(args.iter()), |row| T::from_row(row))?;
            match rows.next() {
                Some(row) => Ok(Some(row?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(|e| StoreError::Join(e.to_string()))?
    }
}

const fn tombstone_clause<T: Record>(hide_tombstoned: bool) -> &'static str {
    if T::SOFT_DELETE && hide_tombstoned {
        " AND deleted = 0"
    } else {
        ""
    }
}

/// Flush a batch in one transaction; all-or-nothing per call.
///
/// Returns the number of rows affected. An empty batch is
/// [`StoreError::NothingToPersist`]; a uniqueness rejection is
/// [`StoreError::Conflict`].
pub async fn commit(db: &Arc<DbManager>, batch: WriteBatch) -> StoreResult<usize> {
    if batch.is_empty() {
        return Err(StoreError::NothingToPersist);
    }

    let staged = batch.len();
    let db = Arc::clone(db);
    task::spawn_blocking(move || -> StoreResult<usize> {
        let mut conn = db.get_connection()?;
        let tx = conn.transaction()?;
        let mut affected = 0;
        for op in batch.ops {
            affected += op(&tx)?;
        }
        tx.commit()?;
        debug!(staged, affected, "write batch committed");
        Ok(affected)
    })
    .await
    .map_err(|e| StoreError::Join(e.to_string()))?
}
