//! # Service Bootstrap
//!
//! Wires the store, broker connections and HTTP router together. The broker
//! is optional at runtime: if it stays unreachable through the startup retry
//! window the service runs in degraded mode with CRUD intact and no events in
//! either direction.

use std::sync::Arc;

use axum::Router;
use tracing::{info, warn};

use crate::config::ServiceConfig;
use crate::database::DatabaseConnection;
use crate::error::Result;
use crate::messaging::{
    wait_for_broker, EventPublisher, RabbitMqPublisher, RetryPolicy, UserEventConsumer,
};
use crate::services::{default_router, TaskLifecycleService};
use crate::store::{PgTaskStore, TaskStore};
use crate::web::{create_app, AppState};

/// Publisher and consumer handles; either may be absent
#[derive(Default)]
pub struct MessagingComponents {
    pub publisher: Option<Arc<dyn EventPublisher>>,
    pub consumer: Option<UserEventConsumer>,
}

impl MessagingComponents {
    /// Either side missing, or the delivery loop has stopped
    pub fn is_degraded(&self) -> bool {
        self.publisher.is_none()
            || !self
                .consumer
                .as_ref()
                .is_some_and(|consumer| consumer.is_consuming())
    }
}

/// Dial the broker and bring up the publisher and consumer
///
/// Never fails: every problem is logged and the affected component is left
/// out.
pub async fn start_messaging(
    config: &ServiceConfig,
    store: Arc<dyn TaskStore>,
) -> MessagingComponents {
    let url = config.rabbitmq_url.as_str();
    let policy = RetryPolicy::from_config(config);
    info!(
        url = %config.rabbitmq_url_redacted(),
        max_attempts = policy.max_attempts,
        max_wait_secs = policy.max_wait().as_secs(),
        "BOOTSTRAP: Waiting for RabbitMQ"
    );

    if !wait_for_broker(url, &policy).await {
        warn!("BOOTSTRAP: RabbitMQ unavailable, running without publisher and consumer");
        return MessagingComponents::default();
    }

    let publisher: Option<Arc<dyn EventPublisher>> = match RabbitMqPublisher::connect(url).await {
        Ok(publisher) => Some(Arc::new(publisher)),
        Err(e) => {
            warn!(error = %e, "BOOTSTRAP: Failed to initialize RabbitMQ publisher");
            None
        }
    };

    let router = Arc::new(default_router(store));
    let consumer = match UserEventConsumer::connect(url, router).await {
        Ok(mut consumer) => match consumer.start_consuming().await {
            Ok(()) => Some(consumer),
            Err(e) => {
                warn!(error = %e, "BOOTSTRAP: Failed to start consuming user events");
                consumer.close().await;
                None
            }
        },
        Err(e) => {
            warn!(error = %e, "BOOTSTRAP: Failed to initialize RabbitMQ consumer");
            None
        }
    };

    MessagingComponents {
        publisher,
        consumer,
    }
}

/// A running task service
pub struct TaskServiceRuntime {
    database: Option<DatabaseConnection>,
    service: TaskLifecycleService,
    messaging: MessagingComponents,
}

impl TaskServiceRuntime {
    /// Connect to PostgreSQL (fatal on failure), then bring up messaging
    pub async fn start(config: ServiceConfig) -> Result<Self> {
        info!(env = %config.task_service_env, "BOOTSTRAP: Starting task service");

        let database =
            DatabaseConnection::connect(&config.database_url, config.database_max_connections)
                .await?;
        database.run_migrations().await?;
        info!("BOOTSTRAP: Database connected and migrated");

        let store: Arc<dyn TaskStore> = Arc::new(PgTaskStore::new(database.pool().clone()));
        let messaging = start_messaging(&config, store.clone()).await;

        let mut runtime = Self::with_components(store, messaging);
        runtime.database = Some(database);
        info!(
            degraded = runtime.is_degraded(),
            "BOOTSTRAP: Task service started"
        );
        Ok(runtime)
    }

    /// Assemble a runtime from already-built parts
    pub fn with_components(store: Arc<dyn TaskStore>, messaging: MessagingComponents) -> Self {
        let service = TaskLifecycleService::new(store, messaging.publisher.clone());
        Self {
            database: None,
            service,
            messaging,
        }
    }

    pub fn service(&self) -> &TaskLifecycleService {
        &self.service
    }

    pub fn is_degraded(&self) -> bool {
        self.messaging.is_degraded()
    }

    pub fn router(&self) -> Router {
        create_app(AppState::new(self.service.clone()))
    }

    /// Close the consumer, then the publisher, then the pool
    pub async fn shutdown(&mut self) {
        info!("BOOTSTRAP: Shutting down task service");
        if let Some(mut consumer) = self.messaging.consumer.take() {
            consumer.close().await;
        }
        if let Some(publisher) = self.messaging.publisher.take() {
            publisher.close().await;
        }
        if let Some(database) = self.database.take() {
            database.close().await;
        }
        info!("BOOTSTRAP: Task service stopped");
    }
}
