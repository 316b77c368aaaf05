//! # Wire Constants
//!
//! Broker topology and routing keys shared with the other services on the
//! bus. These must stay byte-for-byte identical to what existing producers
//! and consumers use.

/// Routing keys for events this service publishes and consumes
pub mod events {
    // Task lifecycle events (published)
    pub const TASK_CREATED: &str = "task.created";
    pub const TASK_UPDATED: &str = "task.updated";
    pub const TASK_DELETED: &str = "task.deleted";

    // User lifecycle events (consumed)
    pub const USER_CREATED: &str = "user.created";
    pub const USER_UPDATED: &str = "user.updated";
    pub const USER_DELETED: &str = "user.deleted";
}

/// Broker topology
pub mod broker {
    /// Durable topic exchange task events are published to
    pub const TASK_EVENTS_EXCHANGE: &str = "task_events";

    /// Durable queue user events are consumed from; bindings are managed elsewhere
    pub const TASK_SERVICE_QUEUE: &str = "task_service_queue";

    pub const CONTENT_TYPE_JSON: &str = "application/json";

    /// AMQP delivery mode 2: persisted by the broker while enqueued
    pub const PERSISTENT_DELIVERY_MODE: u8 = 2;

    pub const CONNECTION_NAME: &str = "task-service";
}

/// Task created for every new user
pub mod welcome_task {
    pub const TITLE: &str = "Welcome to Todo App!";
    pub const DESCRIPTION: &str = "This is your first task. Start organizing your life!";
}
