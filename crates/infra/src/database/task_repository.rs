//! SQLite-backed implementation of the task port.

use std::sync::Arc;

use async_trait::async_trait;
use daybook_core::task::ports::TaskRepository;
use daybook_domain::{Result, Task};
use tracing::instrument;
use uuid::Uuid;

use super::manager::DbManager;
use super::store::{self, SoftDeleteStore, SqlArg, WriteBatch};

/// SQLite implementation of [`TaskRepository`].
pub struct SqliteTaskRepository {
    db: Arc<DbManager>,
    tasks: SoftDeleteStore<Task>,
}

impl SqliteTaskRepository {
    /// Create a new task repository.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { tasks: SoftDeleteStore::new(Arc::clone(&db)), db }
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Task>> {
        Ok(self.tasks.get(id).await?)
    }

    #[instrument(skip(self))]
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Task>> {
        Ok(self
            .tasks
            .list("owner_id = ?1", vec![SqlArg::text(owner_id)], "created_at, id")
            .await?)
    }

    #[instrument(skip(self))]
    async fn list_by_project(&self, project_id: Uuid) -> Result<Vec<Task>> {
        // Projectless tasks have a NULL project_id and are never matched.
        Ok(self
            .tasks
            .list("project_id = ?1", vec![SqlArg::uuid(project_id)], "created_at, id")
            .await?)
    }

    async fn insert(&self, task: &Task) -> Result<()> {
        let mut batch = WriteBatch::new();
        self.tasks.stage_insert(&mut batch, task.clone());
        store::commit(&self.db, batch).await?;
        Ok(())
    }

    async fn update(&self, task: &Task) -> Result<()> {
        let mut batch = WriteBatch::new();
        self.tasks.stage_update(&mut batch, task.clone());
        store::commit(&self.db, batch).await?;
        Ok(())
    }

    async fn remove(&self, task: Task) -> Result<()> {
        let mut batch = WriteBatch::new();
        self.tasks.stage_remove(&mut batch, task);
        store::commit(&self.db, batch).await?;
        Ok(())
    }
}
