//! Database connection manager backed by a pooled SQLite database.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tracing::info;

use super::store::{StoreError, StoreResult};

const SCHEMA_VERSION: i32 = 1;
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Database manager that wraps an r2d2 SQLite pool.
///
/// Connections come up with WAL journaling, foreign keys, and a busy
/// timeout, so concurrent callers are serialized by SQLite rather than by
/// application-level locks.
pub struct DbManager {
    pool: Pool<SqliteConnectionManager>,
    path: PathBuf,
}

impl DbManager {
    /// Create a new manager with the given pool size.
    pub fn new<P: AsRef<Path>>(db_path: P, pool_size: u32) -> StoreResult<Self> {
        let path = db_path.as_ref().to_path_buf();

        let manager = SqliteConnectionManager::file(&path).with_init(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )
        });

        let pool = Pool::builder().max_size(pool_size.max(1)).build(manager)?;

        info!(
            db_path = %path.display(),
            max_connections = pool.max_size(),
            "sqlite pool initialised"
        );

        Ok(Self { pool, path })
    }

    /// Convenience constructor that also applies the schema.
    pub fn open<P: AsRef<Path>>(db_path: P, pool_size: u32) -> StoreResult<Arc<Self>> {
        let manager = Self::new(db_path, pool_size)?;
        manager.run_migrations()?;
        Ok(Arc::new(manager))
    }

    /// Acquire a connection from the pool.
    pub fn get_connection(&self) -> StoreResult<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(StoreError::from)
    }

    /// Ensure the full schema exists on the current database.
    pub fn run_migrations(&self) -> StoreResult<()> {
        let conn = self.get_connection()?;
        conn.execute_batch(SCHEMA_SQL)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at)
             VALUES (?, CAST(strftime('%s','now') AS INTEGER))",
            params![SCHEMA_VERSION],
        )?;
        Ok(())
    }

    /// Return the configured database path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Perform a health check to verify database connectivity.
    pub fn health_check(&self) -> StoreResult<()> {
        let conn = self.get_connection()?;
        conn.query_row("SELECT 1", params![], |row| row.get::<_, i32>(0))?;
        Ok(())
    }
}
