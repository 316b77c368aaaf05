#![allow(dead_code)]

pub mod strategies;

use std::sync::Arc;

use task_service::messaging::{InMemoryEventPublisher, UserEventRouter};
use task_service::services::{default_router, TaskLifecycleService};
use task_service::store::InMemoryTaskStore;
use task_service::UserEvent;

/// Service, store and publisher wired the way bootstrap wires them
pub struct Harness {
    pub store: Arc<InMemoryTaskStore>,
    pub publisher: Arc<InMemoryEventPublisher>,
    pub service: TaskLifecycleService,
    pub router: Arc<UserEventRouter>,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryTaskStore::new());
        let publisher = Arc::new(InMemoryEventPublisher::new());
        let service = TaskLifecycleService::new(store.clone(), Some(publisher.clone()));
        let router = Arc::new(default_router(store.clone()));
        Self {
            store,
            publisher,
            service,
            router,
        }
    }
}

/// JSON body of a user event as the user service would send it
pub fn user_event_body(user_id: i64) -> Vec<u8> {
    UserEvent::new(user_id, "Test User", format!("user{user_id}@example.com"))
        .to_bytes()
        .expect("user event serializes")
}
