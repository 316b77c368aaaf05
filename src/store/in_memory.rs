//! # In-Memory Task Store
//!
//! Thread-safe `TaskStore` for tests and broker-less local runs. A single
//! `parking_lot::RwLock` serializes writes, standing in for the row-level
//! isolation PostgreSQL provides.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use super::TaskStore;
use crate::error::{Result, TaskServiceError};
use crate::models::{Task, TaskPatch, ValidatedTask};

#[derive(Debug)]
pub struct InMemoryTaskStore {
    tasks: RwLock<BTreeMap<i64, Task>>,
    next_id: AtomicI64,
    /// Number of upcoming write operations that should fail (test hook)
    failing_writes: AtomicU32,
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            failing_writes: AtomicU32::new(0),
        }
    }

    /// Make the next `count` writes fail with a store error
    pub fn fail_next_writes(&self, count: u32) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }

    fn check_write(&self, operation: &str) -> Result<()> {
        let injected = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(TaskServiceError::store(operation, "injected write failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn find_all(&self) -> Result<Vec<Task>> {
        Ok(self.tasks.read().values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Task> {
        self.tasks
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| TaskServiceError::not_found(id))
    }

    async fn find_by_owner(&self, user_id: i64) -> Result<Vec<Task>> {
        Ok(self
            .tasks
            .read()
            .values()
            .filter(|task| task.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create(&self, task: ValidatedTask) -> Result<Task> {
        self.check_write("create")?;

        let now = Utc::now();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let task = Task {
            id,
            title: task.title,
            description: task.description,
            completed: task.completed,
            user_id: task.user_id,
            created_at: now,
            updated_at: now,
        };
        self.tasks.write().insert(id, task.clone());
        Ok(task)
    }

    async fn update(&self, id: i64, patch: &TaskPatch) -> Result<Task> {
        self.check_write("update")?;

        let mut tasks = self.tasks.write();
        let task = tasks
            .get_mut(&id)
            .ok_or_else(|| TaskServiceError::not_found(id))?;
        patch.apply_to(task);
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.check_write("delete")?;

        self.tasks
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| TaskServiceError::not_found(id))
    }

    async fn delete_by_owner(&self, user_id: i64) -> Result<u64> {
        self.check_write("delete_by_owner")?;

        let mut tasks = self.tasks.write();
        let before = tasks.len();
        tasks.retain(|_, task| task.user_id != user_id);
        Ok((before - tasks.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewTask;

    fn new_task(title: &str, user_id: i64) -> ValidatedTask {
        NewTask::new(title, user_id).validate().unwrap()
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = InMemoryTaskStore::new();
        let first = store.create(new_task("a", 1)).await.unwrap();
        let second = store.create(new_task("b", 1)).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.created_at, first.updated_at);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_update_bumps_updated_at_and_keeps_created_at() {
        let store = InMemoryTaskStore::new();
        let created = store.create(new_task("a", 1)).await.unwrap();

        let patch = TaskPatch {
            title: Some("renamed".to_string()),
            ..Default::default()
        };
        let updated = store.update(created.id, &patch).await.unwrap();

        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_missing_ids_are_not_found() {
        let store = InMemoryTaskStore::new();
        assert!(store.find_by_id(42).await.unwrap_err().is_not_found());
        assert!(store.delete(42).await.unwrap_err().is_not_found());
        assert!(store
            .update(42, &TaskPatch::default())
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_delete_by_owner_only_touches_that_owner() {
        let store = InMemoryTaskStore::new();
        store.create(new_task("a", 1)).await.unwrap();
        store.create(new_task("b", 1)).await.unwrap();
        store.create(new_task("c", 2)).await.unwrap();

        assert_eq!(store.delete_by_owner(1).await.unwrap(), 2);
        assert!(store.find_by_owner(1).await.unwrap().is_empty());
        assert_eq!(store.find_by_owner(2).await.unwrap().len(), 1);
        assert_eq!(store.delete_by_owner(1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_injected_write_failures() {
        let store = InMemoryTaskStore::new();
        store.fail_next_writes(1);

        let err = store.create(new_task("a", 1)).await.unwrap_err();
        assert!(matches!(err, TaskServiceError::Store { .. }));
        assert!(store.is_empty());

        store.create(new_task("a", 1)).await.unwrap();
        assert_eq!(store.len(), 1);
    }
}
