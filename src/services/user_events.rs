//! # User Event Handlers
//!
//! Task store reactions to user lifecycle events. Handlers are not
//! idempotent: a redelivered `user.created` yields a second welcome task.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::constants::welcome_task;
use crate::error::Result;
use crate::events::{UserEvent, UserEventKind};
use crate::messaging::{HandlerOutcome, UserEventHandler, UserEventRouter};
use crate::models::ValidatedTask;
use crate::store::TaskStore;

/// `user.created`: give the new user a single welcome task
pub struct WelcomeTaskHandler {
    store: Arc<dyn TaskStore>,
}

impl WelcomeTaskHandler {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserEventHandler for WelcomeTaskHandler {
    async fn handle(&self, event: &UserEvent) -> Result<HandlerOutcome> {
        // Written straight to the store: user ids are owned upstream and
        // are not subject to the HTTP input rules
        let task = ValidatedTask {
            title: welcome_task::TITLE.to_string(),
            description: welcome_task::DESCRIPTION.to_string(),
            completed: false,
            user_id: event.user_id,
        };
        let created = self.store.create(task).await?;

        info!(
            user_id = event.user_id,
            task_id = created.id,
            "Created welcome task for new user"
        );
        Ok(HandlerOutcome::TaskCreated {
            task_id: created.id,
        })
    }

    fn name(&self) -> &'static str {
        "welcome_task"
    }
}

/// `user.updated`: nothing to do yet
#[derive(Debug, Default)]
pub struct UserUpdatedHandler;

#[async_trait]
impl UserEventHandler for UserUpdatedHandler {
    async fn handle(&self, event: &UserEvent) -> Result<HandlerOutcome> {
        info!(user_id = event.user_id, "User updated");
        Ok(HandlerOutcome::NoChange)
    }

    fn name(&self) -> &'static str {
        "user_updated"
    }
}

/// `user.deleted`: drop every task the user owned in one bulk delete
pub struct UserTasksCleanupHandler {
    store: Arc<dyn TaskStore>,
}

impl UserTasksCleanupHandler {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserEventHandler for UserTasksCleanupHandler {
    async fn handle(&self, event: &UserEvent) -> Result<HandlerOutcome> {
        let count = self.store.delete_by_owner(event.user_id).await?;
        info!(
            user_id = event.user_id,
            deleted_count = count,
            "Deleted tasks for removed user"
        );
        Ok(HandlerOutcome::TasksDeleted { count })
    }

    fn name(&self) -> &'static str {
        "user_tasks_cleanup"
    }
}

/// Router with the standard handler for every known user event kind
pub fn default_router(store: Arc<dyn TaskStore>) -> UserEventRouter {
    UserEventRouter::new()
        .with_handler(
            UserEventKind::Created,
            Arc::new(WelcomeTaskHandler::new(store.clone())),
        )
        .with_handler(UserEventKind::Updated, Arc::new(UserUpdatedHandler))
        .with_handler(
            UserEventKind::Deleted,
            Arc::new(UserTasksCleanupHandler::new(store)),
        )
}
