//! SQLite-backed user-role repository.
//!
//! Role rows have no tombstone and no surrogate id, so this adapter talks to
//! the connection directly rather than through the generic store.

use std::sync::Arc;

use async_trait::async_trait;
use daybook_core::user::ports::UserRoleRepository;
use daybook_domain::{DaybookError, Result};
use rusqlite::params;
use tokio::task;

use super::manager::DbManager;
use crate::errors::map_join_error;

/// SQLite implementation of [`UserRoleRepository`] with upsert semantics.
pub struct SqliteUserRoleRepository {
    db: Arc<DbManager>,
}

impl SqliteUserRoleRepository {
    /// Create a new repository with the given database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRoleRepository for SqliteUserRoleRepository {
    async fn ensure(&self, user_id: &str, role: &str) -> Result<()> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();
        let role = role.to_string();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let now = chrono::Utc::now().timestamp();
            conn.execute(
                "INSERT INTO user_roles (user_id, role, granted_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id, role) DO NOTHING",
                params![user_id, role, now],
            )
            .map_err(|e| DaybookError::Storage(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn has_role(&self, user_id: &str, role: &str) -> Result<bool> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();
        let role = role.to_string();

        task::spawn_blocking(move || -> Result<bool> {
            let conn = db.get_connection()?;
            let exists: i64 = conn
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM user_roles WHERE user_id = ?1 AND role = ?2)",
                    params![user_id, role],
                    |row| row.get(0),
                )
                .map_err(|e| DaybookError::Storage(e.to_string()))?;
            Ok(exists != 0)
        })
        .await
        .map_err(map_join_error)?
    }
}
