//! Port interfaces for task persistence

use async_trait::async_trait;
use daybook_domain::{Result, Task};
use uuid::Uuid;

/// Task persistence. Default reads hide tombstoned rows.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Load a live task.
    async fn get(&self, id: Uuid) -> Result<Option<Task>>;

    /// Live tasks owned by `owner_id`, ordered by creation time. Includes
    /// tasks with no project reference.
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Task>>;

    /// Live tasks attached to a project, ordered by creation time.
    /// Projectless tasks never appear in a project-scoped listing.
    async fn list_by_project(&self, project_id: Uuid) -> Result<Vec<Task>>;

    /// Insert a new task.
    async fn insert(&self, task: &Task) -> Result<()>;

    /// Overwrite a task's mutable fields.
    async fn update(&self, task: &Task) -> Result<()>;

    /// Tombstone a task.
    async fn remove(&self, task: Task) -> Result<()>;
}
