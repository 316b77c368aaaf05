//! # Task Event Publisher
//!
//! Emits task lifecycle events to the durable `task_events` topic exchange.
//! Delivery is at-most-once from the caller's point of view: a failed publish
//! is returned to the caller, never retried or queued locally.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use lapin::options::{BasicPublishOptions, ExchangeDeclareOptions};
use lapin::types::FieldTable;
use lapin::{BasicProperties, ExchangeKind};
use parking_lot::Mutex;
use tracing::{debug, info};

use super::connection::BrokerConnection;
use crate::constants::broker;
use crate::events::{TaskEvent, TaskEventKind};
use crate::messaging::{MessagingError, MessagingResult};

/// Outbound side of the event bus
#[async_trait]
pub trait EventPublisher: Send + Sync + 'static {
    /// Serialize `event` and send it under `kind`'s routing key
    async fn publish(&self, kind: TaskEventKind, event: &TaskEvent) -> MessagingResult<()>;

    /// Release the underlying channel and connection
    async fn close(&self);

    /// Whether the publisher can currently accept events
    fn is_available(&self) -> bool;

    fn provider_name(&self) -> &'static str;
}

/// Exchange type for task events: routed by `task.*` keys
fn task_events_exchange_kind() -> ExchangeKind {
    ExchangeKind::Topic
}

/// Survives broker restarts; never auto-deleted or internal
fn task_events_exchange_options() -> ExchangeDeclareOptions {
    ExchangeDeclareOptions {
        durable: true,
        ..Default::default()
    }
}

/// Persistent JSON message properties attached to every task event
fn task_event_properties() -> BasicProperties {
    BasicProperties::default()
        .with_delivery_mode(broker::PERSISTENT_DELIVERY_MODE)
        .with_content_type(broker::CONTENT_TYPE_JSON.into())
}

/// RabbitMQ publisher owning its own connection and channel
#[derive(Debug)]
pub struct RabbitMqPublisher {
    connection: BrokerConnection,
    exchange: String,
    total_published: AtomicU64,
}

impl RabbitMqPublisher {
    /// Dial the broker and declare the task events exchange
    pub async fn connect(url: &str) -> MessagingResult<Self> {
        let connection = BrokerConnection::connect(url).await?;
        match Self::from_connection(connection, broker::TASK_EVENTS_EXCHANGE).await {
            Ok(publisher) => Ok(publisher),
            Err((connection, e)) => {
                connection.close().await;
                Err(e)
            }
        }
    }

    /// Declare `exchange` (durable topic, idempotent) on an open connection
    ///
    /// On failure the connection is handed back so the caller can close it.
    pub async fn from_connection(
        connection: BrokerConnection,
        exchange: &str,
    ) -> Result<Self, (BrokerConnection, MessagingError)> {
        let declared = connection
            .channel()
            .exchange_declare(
                exchange,
                task_events_exchange_kind(),
                task_events_exchange_options(),
                FieldTable::default(),
            )
            .await;

        if let Err(e) = declared {
            return Err((
                connection,
                MessagingError::topology(exchange, format!("Exchange declaration failed: {}", e)),
            ));
        }

        info!(exchange = exchange, "RabbitMQ publisher initialized");
        Ok(Self {
            connection,
            exchange: exchange.to_string(),
            total_published: AtomicU64::new(0),
        })
    }

    pub fn total_published(&self) -> u64 {
        self.total_published.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl EventPublisher for RabbitMqPublisher {
    async fn publish(&self, kind: TaskEventKind, event: &TaskEvent) -> MessagingResult<()> {
        let routing_key = kind.routing_key();
        let body = event
            .to_bytes()
            .map_err(|e| MessagingError::serialization(e.to_string()))?;

        let confirm = self
            .connection
            .channel()
            .basic_publish(
                &self.exchange,
                routing_key,
                BasicPublishOptions::default(),
                &body,
                task_event_properties(),
            )
            .await
            .map_err(|e| MessagingError::publish(routing_key, format!("Publish failed: {}", e)))?;

        confirm.await.map_err(|e| {
            MessagingError::publish(routing_key, format!("Publish confirmation failed: {}", e))
        })?;

        self.total_published.fetch_add(1, Ordering::Relaxed);
        debug!(
            routing_key = routing_key,
            task_id = event.task_id,
            "Published task event"
        );
        Ok(())
    }

    async fn close(&self) {
        self.connection.close().await;
        info!(
            exchange = %self.exchange,
            total_published = self.total_published(),
            "RabbitMQ publisher closed"
        );
    }

    fn is_available(&self) -> bool {
        self.connection.is_connected()
    }

    fn provider_name(&self) -> &'static str {
        "rabbitmq"
    }
}

/// An event captured by `InMemoryEventPublisher`
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedTaskEvent {
    pub routing_key: String,
    pub event: TaskEvent,
    /// The exact JSON body that would have gone on the wire
    pub body: Vec<u8>,
}

/// Publisher that records events in memory, for tests and broker-less runs
#[derive(Debug, Default)]
pub struct InMemoryEventPublisher {
    published: Mutex<Vec<PublishedTaskEvent>>,
    failing: AtomicBool,
    closed: AtomicBool,
}

impl InMemoryEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent publish fail, simulating an unreachable broker
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn published(&self) -> Vec<PublishedTaskEvent> {
        self.published.lock().clone()
    }

    pub fn published_with(&self, kind: TaskEventKind) -> Vec<TaskEvent> {
        self.published
            .lock()
            .iter()
            .filter(|p| p.routing_key == kind.routing_key())
            .map(|p| p.event.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.published.lock().clear();
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, kind: TaskEventKind, event: &TaskEvent) -> MessagingResult<()> {
        let routing_key = kind.routing_key();
        if self.closed.load(Ordering::SeqCst) {
            return Err(MessagingError::publish(routing_key, "publisher is closed"));
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(MessagingError::publish(routing_key, "broker unreachable"));
        }

        let body = event
            .to_bytes()
            .map_err(|e| MessagingError::serialization(e.to_string()))?;
        self.published.lock().push(PublishedTaskEvent {
            routing_key: routing_key.to_string(),
            event: event.clone(),
            body,
        });
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_available(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    fn provider_name(&self) -> &'static str {
        "in_memory"
    }
}
