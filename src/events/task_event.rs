use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::events;
use crate::models::Task;

/// Kinds of task lifecycle events, one per routing key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskEventKind {
    Created,
    Updated,
    Deleted,
}

impl TaskEventKind {
    pub fn routing_key(self) -> &'static str {
        match self {
            Self::Created => events::TASK_CREATED,
            Self::Updated => events::TASK_UPDATED,
            Self::Deleted => events::TASK_DELETED,
        }
    }
}

impl fmt::Display for TaskEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.routing_key())
    }
}

/// Point-in-time snapshot of a task, published after a store mutation
///
/// Exactly one of the three timestamps is set, matching the event kind;
/// the others are omitted from the JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEvent {
    pub task_id: i64,
    pub title: String,
    pub description: String,
    pub user_id: i64,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TaskEvent {
    fn snapshot(task: &Task) -> Self {
        Self {
            task_id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            user_id: task.user_id,
            completed: task.completed,
            created_at: None,
            updated_at: None,
            deleted_at: None,
        }
    }

    pub fn created(task: &Task) -> Self {
        Self {
            created_at: Some(task.created_at),
            ..Self::snapshot(task)
        }
    }

    pub fn updated(task: &Task) -> Self {
        Self {
            updated_at: Some(task.updated_at),
            ..Self::snapshot(task)
        }
    }

    /// Capture a task about to be deleted; the store keeps no deletion time
    pub fn deleted(task: &Task, deleted_at: DateTime<Utc>) -> Self {
        Self {
            deleted_at: Some(deleted_at),
            ..Self::snapshot(task)
        }
    }

    /// Infer the kind from whichever timestamp is populated
    pub fn kind(&self) -> Option<TaskEventKind> {
        match (self.created_at, self.updated_at, self.deleted_at) {
            (Some(_), None, None) => Some(TaskEventKind::Created),
            (None, Some(_), None) => Some(TaskEventKind::Updated),
            (None, None, Some(_)) => Some(TaskEventKind::Deleted),
            _ => None,
        }
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
