//! Error types for the task service.
//!
//! Facade operations propagate these synchronously to the caller. The
//! asynchronous event path (publishing and consuming) logs and absorbs them.

use thiserror::Error;

use crate::messaging::MessagingError;

#[derive(Debug, Error)]
pub enum TaskServiceError {
    #[error("Validation error: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Task not found: {task_id}")]
    NotFound { task_id: i64 },

    #[error("Store error: {operation}: {message}")]
    Store { operation: String, message: String },

    #[error("Messaging error: {0}")]
    Messaging(#[from] MessagingError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl TaskServiceError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(task_id: i64) -> Self {
        Self::NotFound { task_id }
    }

    pub fn store(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Store {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Wrap a sqlx error with the store operation that produced it
    pub fn from_sqlx(operation: impl Into<String>, err: sqlx::Error) -> Self {
        Self::store(operation, err.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

impl From<config::ConfigError> for TaskServiceError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TaskServiceError>;
