//! Task service - core business logic
//!
//! Shares the "owner XOR elevated role" authorization shape with integration
//! connections, independently from the calendar subsystem.

use std::sync::Arc;

use chrono::Utc;
use daybook_domain::{DaybookError, Result, Task, TaskDraft, TaskPatch, TaskStatus};
use tracing::debug;
use uuid::Uuid;

use super::ports::TaskRepository;
use crate::policy::{self, Actor};

/// Ownership-gated task lifecycle service.
pub struct TaskService {
    tasks: Arc<dyn TaskRepository>,
}

impl TaskService {
    /// Create a new task service.
    pub fn new(tasks: Arc<dyn TaskRepository>) -> Self {
        Self { tasks }
    }

    /// Create a task owned by the actor. Status and priority fall back to
    /// their defaults when not supplied.
    pub async fn create(&self, actor: &Actor, draft: TaskDraft) -> Result<Task> {
        if actor.user_id.trim().is_empty() {
            return Err(DaybookError::Validation("task owner must not be empty".into()));
        }
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(DaybookError::Validation("task title must not be empty".into()));
        }

        let status = draft.status.unwrap_or_default();
        let task = Task {
            id: Uuid::now_v7(),
            project_id: draft.project_id,
            owner_id: actor.user_id.clone(),
            title: title.to_string(),
            description: draft.description,
            status,
            priority: draft.priority.unwrap_or_default(),
            assignee: draft.assignee,
            due_at: draft.due_at,
            completed_at: status.is_terminal().then(Utc::now),
            created_at: Utc::now(),
            deleted: false,
        };

        self.tasks.insert(&task).await?;
        debug!(task_id = %task.id, owner = %task.owner_id, "task created");
        Ok(task)
    }

    /// Live tasks owned by the actor.
    pub async fn list_for_user(&self, actor: &Actor) -> Result<Vec<Task>> {
        self.tasks.list_for_owner(&actor.user_id).await
    }

    /// Live tasks attached to a project.
    pub async fn list_by_project(&self, project_id: Uuid) -> Result<Vec<Task>> {
        self.tasks.list_by_project(project_id).await
    }

    /// Change a task's status. The terminal status stamps `completed_at`
    /// with the call's timestamp; any other value clears it.
    pub async fn update_status(
        &self,
        task_id: Uuid,
        actor: &Actor,
        status: TaskStatus,
    ) -> Result<Task> {
        let mut task = self.load_owned(task_id, actor).await?;

        task.status = status;
        task.completed_at = status.is_terminal().then(Utc::now);

        self.tasks.update(&task).await?;
        debug!(task_id = %task.id, status = %status, "task status updated");
        Ok(task)
    }

    /// Update task details. Absent patch fields are left unchanged, except
    /// the due date, which is always overwritten with the supplied value
    /// (including explicit clearing).
    pub async fn update_details(
        &self,
        task_id: Uuid,
        actor: &Actor,
        patch: TaskPatch,
    ) -> Result<Task> {
        let mut task = self.load_owned(task_id, actor).await?;

        if let Some(title) = patch.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(DaybookError::Validation("task title must not be empty".into()));
            }
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = Some(description);
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(assignee) = patch.assignee {
            task.assignee = Some(assignee);
        }
        if let Some(project_id) = patch.project_id {
            task.project_id = Some(project_id);
        }
        task.due_at = patch.due_at;

        self.tasks.update(&task).await?;
        debug!(task_id = %task.id, "task details updated");
        Ok(task)
    }

    /// Tombstone a task.
    pub async fn delete(&self, task_id: Uuid, actor: &Actor) -> Result<()> {
        let task = self.load_owned(task_id, actor).await?;
        let id = task.id;
        self.tasks.remove(task).await?;
        debug!(task_id = %id, "task deleted");
        Ok(())
    }

    async fn load_owned(&self, task_id: Uuid, actor: &Actor) -> Result<Task> {
        let task = self
            .tasks
            .get(task_id)
            .await?
            .ok_or_else(|| DaybookError::NotFound(format!("task {task_id}")))?;

        policy::owner_or_elevated(&task.owner_id, actor).require("task")?;
        Ok(task)
    }
}
