//! # Task Store
//!
//! Persistence boundary for task rows. The store owns task rows exclusively
//! and is shared between the HTTP-facing facade and the user event handlers,
//! so implementations must serialize conflicting writes themselves.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Task, TaskPatch, ValidatedTask};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryTaskStore;
pub use postgres::PgTaskStore;

/// Task persistence operations
///
/// Lookups and mutations by id fail with `TaskServiceError::NotFound` when
/// the row does not exist; any backend failure is `TaskServiceError::Store`.
#[async_trait]
pub trait TaskStore: Send + Sync + 'static {
    async fn find_all(&self) -> Result<Vec<Task>>;

    async fn find_by_id(&self, id: i64) -> Result<Task>;

    async fn find_by_owner(&self, user_id: i64) -> Result<Vec<Task>>;

    /// Insert a task; the store assigns the id and both timestamps
    async fn create(&self, task: ValidatedTask) -> Result<Task>;

    /// Apply the present patch fields and bump `updated_at`
    async fn update(&self, id: i64, patch: &TaskPatch) -> Result<Task>;

    /// Physically remove one task
    async fn delete(&self, id: i64) -> Result<()>;

    /// Remove every task owned by `user_id` in one operation, returning the count
    async fn delete_by_owner(&self, user_id: i64) -> Result<u64>;
}
