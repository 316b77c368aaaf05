//! # Messaging Module
//!
//! RabbitMQ integration: a publisher for task lifecycle events, a consumer for
//! user lifecycle events, and the startup connection policy both share.
//!
//! The publisher and consumer each own a separate connection and channel, so
//! a failure in one never disturbs the other.

pub mod connection;
pub mod consumer;
pub mod errors;
pub mod publisher;
pub mod router;

pub use connection::{retry_with_policy, wait_for_broker, BrokerConnection, RetryPolicy};
pub use consumer::{
    run_delivery_loop, ConsumerState, DeliveryLoopStats, InboundMessage, LoopExit,
    UserEventConsumer,
};
pub use errors::{MessagingError, MessagingResult};
pub use publisher::{EventPublisher, InMemoryEventPublisher, PublishedTaskEvent, RabbitMqPublisher};
pub use router::{DispatchOutcome, HandlerOutcome, UserEventHandler, UserEventRouter};
