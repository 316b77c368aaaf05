//! # Task Model
//!
//! The `tasks` row plus the input types the service accepts for creating
//! and patching tasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{Result, TaskServiceError};

/// Task represents one unit of work owned by a user
/// Maps to the `tasks` table
///
/// `user_id` refers to a user owned by another service; nothing here checks
/// that the user exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New Task for creation (without generated fields)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// Partial update; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// A `NewTask` that passed validation, ready for the store
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTask {
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub user_id: i64,
}

impl NewTask {
    pub fn new(title: impl Into<String>, user_id: i64) -> Self {
        Self {
            title: Some(title.into()),
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check required fields: non-blank title and a positive owning user id
    pub fn validate(self) -> Result<ValidatedTask> {
        let title = match self.title {
            Some(title) if !title.trim().is_empty() => title,
            Some(_) => return Err(TaskServiceError::validation("title", "must not be empty")),
            None => return Err(TaskServiceError::validation("title", "is required")),
        };
        let user_id = match self.user_id {
            Some(user_id) if user_id > 0 => user_id,
            Some(_) => {
                return Err(TaskServiceError::validation(
                    "user_id",
                    "must be a positive integer",
                ))
            }
            None => return Err(TaskServiceError::validation("user_id", "is required")),
        };

        Ok(ValidatedTask {
            title,
            description: self.description.unwrap_or_default(),
            completed: self.completed.unwrap_or(false),
            user_id,
        })
    }
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.user_id.is_none()
    }

    /// Fields that are present must still satisfy the creation rules
    pub fn validate(&self) -> Result<()> {
        if matches!(&self.title, Some(title) if title.trim().is_empty()) {
            return Err(TaskServiceError::validation("title", "must not be empty"));
        }
        if matches!(self.user_id, Some(user_id) if user_id <= 0) {
            return Err(TaskServiceError::validation(
                "user_id",
                "must be a positive integer",
            ));
        }
        Ok(())
    }

    /// Apply present fields to a task in place
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(user_id) = self.user_id {
            task.user_id = user_id;
        }
    }
}
