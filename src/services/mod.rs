//! # Services
//!
//! Domain logic sitting between the transports (HTTP, broker) and the task
//! store.

pub mod task_lifecycle;
pub mod user_events;

pub use task_lifecycle::TaskLifecycleService;
pub use user_events::{
    default_router, UserTasksCleanupHandler, UserUpdatedHandler, WelcomeTaskHandler,
};
