//! # Task Lifecycle Service
//!
//! Wraps each task store mutation with the matching task event. The store
//! write is the source of truth: it happens first, and a publish failure
//! afterwards is logged without affecting the caller's result. Store write
//! and publish are not transactional, so a crash between them loses the
//! event.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::events::{TaskEvent, TaskEventKind};
use crate::messaging::EventPublisher;
use crate::models::{NewTask, Task, TaskPatch};
use crate::store::TaskStore;

/// Facade shared by the HTTP handlers
///
/// The publisher is optional: without one (broker unreachable at startup)
/// every operation still succeeds and simply emits nothing.
#[derive(Clone)]
pub struct TaskLifecycleService {
    store: Arc<dyn TaskStore>,
    publisher: Option<Arc<dyn EventPublisher>>,
}

impl std::fmt::Debug for TaskLifecycleService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskLifecycleService")
            .field(
                "publisher",
                &self.publisher.as_ref().map(|p| p.provider_name()),
            )
            .finish_non_exhaustive()
    }
}

impl TaskLifecycleService {
    pub fn new(store: Arc<dyn TaskStore>, publisher: Option<Arc<dyn EventPublisher>>) -> Self {
        Self { store, publisher }
    }

    /// Whether a publisher is configured and currently usable
    pub fn messaging_available(&self) -> bool {
        self.publisher
            .as_ref()
            .is_some_and(|publisher| publisher.is_available())
    }

    pub async fn list_tasks(&self) -> Result<Vec<Task>> {
        self.store.find_all().await
    }

    pub async fn get_task(&self, id: i64) -> Result<Task> {
        self.store.find_by_id(id).await
    }

    pub async fn tasks_for_user(&self, user_id: i64) -> Result<Vec<Task>> {
        self.store.find_by_owner(user_id).await
    }

    /// Validate, persist, then announce `task.created`
    pub async fn create_task(&self, input: NewTask) -> Result<Task> {
        let validated = input.validate()?;
        let task = self.store.create(validated).await?;
        info!(task_id = task.id, user_id = task.user_id, "Task created");

        self.publish(TaskEventKind::Created, TaskEvent::created(&task))
            .await;
        Ok(task)
    }

    /// Apply the present fields of `patch`, then announce `task.updated`
    ///
    /// A missing task is reported before the patch is validated.
    pub async fn update_task(&self, id: i64, patch: TaskPatch) -> Result<Task> {
        self.store.find_by_id(id).await?;
        patch.validate()?;
        let task = self.store.update(id, &patch).await?;
        info!(task_id = task.id, user_id = task.user_id, "Task updated");

        self.publish(TaskEventKind::Updated, TaskEvent::updated(&task))
            .await;
        Ok(task)
    }

    /// Snapshot, delete, then announce `task.deleted` with the snapshot
    pub async fn delete_task(&self, id: i64) -> Result<()> {
        let existing = self.store.find_by_id(id).await?;
        let snapshot = TaskEvent::deleted(&existing, Utc::now());

        self.store.delete(id).await?;
        info!(task_id = id, user_id = existing.user_id, "Task deleted");

        self.publish(TaskEventKind::Deleted, snapshot).await;
        Ok(())
    }

    async fn publish(&self, kind: TaskEventKind, event: TaskEvent) {
        let Some(publisher) = &self.publisher else {
            debug!(routing_key = kind.routing_key(), task_id = event.task_id, "No publisher, skipping event");
            return;
        };

        if let Err(e) = publisher.publish(kind, &event).await {
            warn!(
                routing_key = kind.routing_key(),
                task_id = event.task_id,
                error = %e,
                "Failed to publish task event"
            );
        }
    }
}
