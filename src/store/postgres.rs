//! PostgreSQL-backed `TaskStore` using sqlx.

use async_trait::async_trait;
use sqlx::PgPool;

use super::TaskStore;
use crate::error::{Result, TaskServiceError};
use crate::models::{Task, TaskPatch, ValidatedTask};

/// Task store over the `tasks` table
#[derive(Debug, Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn find_all(&self) -> Result<Vec<Task>> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, completed, user_id, created_at, updated_at
            FROM tasks
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| TaskServiceError::from_sqlx("find_all", e))
    }

    async fn find_by_id(&self, id: i64) -> Result<Task> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, completed, user_id, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TaskServiceError::from_sqlx("find_by_id", e))?
        .ok_or_else(|| TaskServiceError::not_found(id))
    }

    async fn find_by_owner(&self, user_id: i64) -> Result<Vec<Task>> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, completed, user_id, created_at, updated_at
            FROM tasks
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| TaskServiceError::from_sqlx("find_by_owner", e))
    }

    async fn create(&self, task: ValidatedTask) -> Result<Task> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, completed, user_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING id, title, description, completed, user_id, created_at, updated_at
            "#,
        )
        .bind(task.title)
        .bind(task.description)
        .bind(task.completed)
        .bind(task.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| TaskServiceError::from_sqlx("create", e))
    }

    async fn update(&self, id: i64, patch: &TaskPatch) -> Result<Task> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                completed = COALESCE($4, completed),
                user_id = COALESCE($5, user_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, completed, user_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(patch.title.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.completed)
        .bind(patch.user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TaskServiceError::from_sqlx("update", e))?
        .ok_or_else(|| TaskServiceError::not_found(id))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| TaskServiceError::from_sqlx("delete", e))?;

        if result.rows_affected() == 0 {
            return Err(TaskServiceError::not_found(id));
        }
        Ok(())
    }

    async fn delete_by_owner(&self, user_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM tasks WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| TaskServiceError::from_sqlx("delete_by_owner", e))?;

        Ok(result.rows_affected())
    }
}
