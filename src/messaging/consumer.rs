//! # User Event Consumer
//!
//! Subscribes to the durable `task_service_queue` and feeds every delivery to
//! the `UserEventRouter`, one message at a time, on a dedicated tokio task.
//!
//! Deliveries are auto-acknowledged on receipt (`no_ack = true`). A handler
//! failure therefore loses the message: the broker already considers it
//! delivered and will not redeliver it. Only a crash before receipt leads to
//! redelivery, which can duplicate welcome tasks since handlers are not
//! idempotent.

use std::fmt;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use lapin::options::{BasicConsumeOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::connection::BrokerConnection;
use super::router::{DispatchOutcome, UserEventRouter};
use crate::constants::broker;
use crate::messaging::{MessagingError, MessagingResult};

const CONSUMER_TAG: &str = "task-service-user-events";

/// Durable, shared and kept when the last consumer leaves
fn user_events_queue_options() -> QueueDeclareOptions {
    QueueDeclareOptions {
        durable: true,
        exclusive: false,
        auto_delete: false,
        ..Default::default()
    }
}

/// Auto-ack on receipt
fn consume_options() -> BasicConsumeOptions {
    BasicConsumeOptions {
        no_ack: true,
        ..Default::default()
    }
}

/// Consumer lifecycle
///
/// `Uninitialized -> Connected -> Consuming -> Closed`. Losing the connection
/// while consuming simply ends delivery; it is not a separate state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConsumerState {
    #[default]
    Uninitialized,
    Connected,
    Consuming,
    Closed,
}

impl ConsumerState {
    fn ensure(self, expected: ConsumerState, operation: &str) -> MessagingResult<()> {
        if self == expected {
            Ok(())
        } else {
            Err(MessagingError::invalid_state(operation, self))
        }
    }
}

impl fmt::Display for ConsumerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Connected => "connected",
            Self::Consuming => "consuming",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// A delivery reduced to what dispatch needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub routing_key: String,
    pub body: Vec<u8>,
}

impl InboundMessage {
    pub fn new(routing_key: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            routing_key: routing_key.into(),
            body: body.into(),
        }
    }
}

/// Why the delivery loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Shutdown,
    StreamEnded,
    StreamError,
}

/// Counters reported when the delivery loop exits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryLoopStats {
    pub received: u64,
    pub handled: u64,
    pub unknown_routing_key: u64,
    pub decode_failed: u64,
    pub handler_failed: u64,
    pub exit: LoopExit,
}

impl DeliveryLoopStats {
    fn new() -> Self {
        Self {
            received: 0,
            handled: 0,
            unknown_routing_key: 0,
            decode_failed: 0,
            handler_failed: 0,
            exit: LoopExit::StreamEnded,
        }
    }

    fn record(&mut self, outcome: &DispatchOutcome) {
        self.received += 1;
        match outcome {
            DispatchOutcome::Handled { .. } => self.handled += 1,
            DispatchOutcome::UnknownRoutingKey(_) | DispatchOutcome::NoHandler(_) => {
                self.unknown_routing_key += 1
            }
            DispatchOutcome::DecodeFailed { .. } => self.decode_failed += 1,
            DispatchOutcome::HandlerFailed { .. } => self.handler_failed += 1,
        }
    }
}

/// Process deliveries sequentially until shutdown or the stream stops
///
/// Each message is dispatched to completion before the next is pulled, so
/// processing order equals delivery order. Once shutdown is observed no
/// further message is dispatched.
pub async fn run_delivery_loop<S>(
    deliveries: S,
    router: Arc<UserEventRouter>,
    mut shutdown: watch::Receiver<bool>,
) -> DeliveryLoopStats
where
    S: Stream<Item = MessagingResult<InboundMessage>>,
{
    tokio::pin!(deliveries);
    let mut stats = DeliveryLoopStats::new();

    loop {
        if *shutdown.borrow() {
            stats.exit = LoopExit::Shutdown;
            break;
        }

        tokio::select! {
            biased;

            changed = shutdown.changed() => {
                // A dropped sender also means nobody will ever stop us cleanly
                if changed.is_err() || *shutdown.borrow() {
                    stats.exit = LoopExit::Shutdown;
                    break;
                }
            }
            next = deliveries.next() => match next {
                Some(Ok(message)) => {
                    let outcome = router.dispatch(&message.routing_key, &message.body).await;
                    stats.record(&outcome);
                }
                Some(Err(e)) => {
                    error!(error = %e, "Delivery stream failed, consumer stopping");
                    stats.exit = LoopExit::StreamError;
                    break;
                }
                None => {
                    warn!("Delivery stream ended, consumer stopping");
                    stats.exit = LoopExit::StreamEnded;
                    break;
                }
            },
        }
    }

    info!(
        received = stats.received,
        handled = stats.handled,
        handler_failed = stats.handler_failed,
        exit = ?stats.exit,
        "User event delivery loop exited"
    );
    stats
}

/// RabbitMQ consumer owning its own connection and channel
pub struct UserEventConsumer {
    connection: BrokerConnection,
    router: Arc<UserEventRouter>,
    queue_name: String,
    state: ConsumerState,
    shutdown_tx: Option<watch::Sender<bool>>,
    loop_handle: Option<JoinHandle<DeliveryLoopStats>>,
}

impl fmt::Debug for UserEventConsumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserEventConsumer")
            .field("queue_name", &self.queue_name)
            .field("state", &self.state)
            .field("router", &self.router)
            .finish()
    }
}

impl UserEventConsumer {
    /// Dial the broker; the consumer starts in `Connected`
    pub async fn connect(url: &str, router: Arc<UserEventRouter>) -> MessagingResult<Self> {
        let connection = BrokerConnection::connect(url).await?;
        Ok(Self::from_connection(
            connection,
            router,
            broker::TASK_SERVICE_QUEUE,
        ))
    }

    pub fn from_connection(
        connection: BrokerConnection,
        router: Arc<UserEventRouter>,
        queue_name: &str,
    ) -> Self {
        Self {
            connection,
            router,
            queue_name: queue_name.to_string(),
            state: ConsumerState::Connected,
            shutdown_tx: None,
            loop_handle: None,
        }
    }

    pub fn state(&self) -> ConsumerState {
        self.state
    }

    /// Whether the delivery loop is still running
    pub fn is_consuming(&self) -> bool {
        self.state == ConsumerState::Consuming
            && self
                .loop_handle
                .as_ref()
                .is_some_and(|handle| !handle.is_finished())
    }

    /// Declare the queue and spawn the delivery loop
    pub async fn start_consuming(&mut self) -> MessagingResult<()> {
        self.state
            .ensure(ConsumerState::Connected, "start_consuming")?;

        let channel = self.connection.channel();
        channel
            .queue_declare(
                &self.queue_name,
                user_events_queue_options(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| {
                MessagingError::topology(&self.queue_name, format!("Queue declaration failed: {}", e))
            })?;

        let consumer = channel
            .basic_consume(
                &self.queue_name,
                CONSUMER_TAG,
                consume_options(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| MessagingError::consume(&self.queue_name, format!("basic_consume failed: {}", e)))?;

        let queue_name = self.queue_name.clone();
        let deliveries = consumer.map(move |delivery| {
            delivery
                .map(|d| InboundMessage {
                    routing_key: d.routing_key.as_str().to_string(),
                    body: d.data,
                })
                .map_err(|e| MessagingError::consume(&queue_name, e.to_string()))
        });

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let router = self.router.clone();
        self.loop_handle = Some(tokio::spawn(run_delivery_loop(
            deliveries,
            router,
            shutdown_rx,
        )));
        self.shutdown_tx = Some(shutdown_tx);
        self.state = ConsumerState::Consuming;

        info!(queue = %self.queue_name, "RabbitMQ consumer started, waiting for messages...");
        Ok(())
    }

    /// Stop the delivery loop and release the channel and connection
    ///
    /// Idempotent; returns the loop's counters the first time it stops a
    /// running loop.
    pub async fn close(&mut self) -> Option<DeliveryLoopStats> {
        if self.state == ConsumerState::Closed {
            return None;
        }

        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(true);
        }

        let stats = match self.loop_handle.take() {
            Some(handle) => match handle.await {
                Ok(stats) => Some(stats),
                Err(e) => {
                    error!(error = %e, "Delivery loop task panicked or was cancelled");
                    None
                }
            },
            None => None,
        };

        self.connection.close().await;
        self.state = ConsumerState::Closed;
        info!(queue = %self.queue_name, "RabbitMQ consumer closed");
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::events::{UserEvent, UserEventKind};
    use crate::messaging::router::{HandlerOutcome, UserEventHandler};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Records the user ids it sees, in order
    #[derive(Default)]
    struct RecordingHandler {
        seen: Mutex<Vec<i64>>,
    }

    #[async_trait]
    impl UserEventHandler for RecordingHandler {
        async fn handle(&self, event: &UserEvent) -> Result<HandlerOutcome> {
            // Yield so a concurrent implementation would interleave
            tokio::task::yield_now().await;
            self.seen.lock().push(event.user_id);
            Ok(HandlerOutcome::NoChange)
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    fn message(routing_key: &str, user_id: i64) -> MessagingResult<InboundMessage> {
        Ok(InboundMessage::new(
            routing_key,
            format!(r#"{{"user_id": {user_id}}}"#),
        ))
    }

    fn router_with(handler: Arc<RecordingHandler>) -> Arc<UserEventRouter> {
        Arc::new(UserEventRouter::new().with_handler(UserEventKind::Created, handler))
    }

    #[test]
    fn test_state_guards() {
        assert!(ConsumerState::Connected
            .ensure(ConsumerState::Connected, "start_consuming")
            .is_ok());
        for state in [
            ConsumerState::Uninitialized,
            ConsumerState::Consuming,
            ConsumerState::Closed,
        ] {
            let err = state
                .ensure(ConsumerState::Connected, "start_consuming")
                .unwrap_err();
            assert!(matches!(err, MessagingError::InvalidState { .. }));
        }
        assert_eq!(ConsumerState::default(), ConsumerState::Uninitialized);
    }

    #[test]
    fn test_user_events_queue_is_durable_and_shared() {
        let options = user_events_queue_options();
        assert!(options.durable);
        assert!(!options.exclusive);
        assert!(!options.auto_delete);
        assert!(!options.passive);
    }

    #[test]
    fn test_consume_auto_acks() {
        let options = consume_options();
        assert!(options.no_ack);
        assert!(!options.exclusive);
        assert!(!options.no_local);
        assert_eq!(CONSUMER_TAG, "task-service-user-events");
    }

    #[tokio::test]
    async fn test_loop_processes_in_delivery_order() {
        let handler = Arc::new(RecordingHandler::default());
        let deliveries = futures::stream::iter((1..=5).map(|id| message("user.created", id)));
        let (_tx, rx) = watch::channel(false);

        let stats = run_delivery_loop(deliveries, router_with(handler.clone()), rx).await;

        assert_eq!(*handler.seen.lock(), vec![1, 2, 3, 4, 5]);
        assert_eq!(stats.received, 5);
        assert_eq!(stats.handled, 5);
        assert_eq!(stats.exit, LoopExit::StreamEnded);
    }

    #[tokio::test]
    async fn test_loop_survives_bad_messages() {
        let handler = Arc::new(RecordingHandler::default());
        let deliveries = futures::stream::iter(vec![
            message("user.created", 1),
            Ok(InboundMessage::new("user.created", "not json")),
            message("billing.invoice", 2),
            message("user.created", 3),
        ]);
        let (_tx, rx) = watch::channel(false);

        let stats = run_delivery_loop(deliveries, router_with(handler.clone()), rx).await;

        assert_eq!(*handler.seen.lock(), vec![1, 3]);
        assert_eq!(stats.received, 4);
        assert_eq!(stats.decode_failed, 1);
        assert_eq!(stats.unknown_routing_key, 1);
    }

    #[tokio::test]
    async fn test_stream_error_ends_loop() {
        let handler = Arc::new(RecordingHandler::default());
        let deliveries = futures::stream::iter(vec![
            message("user.created", 1),
            Err(MessagingError::consume("task_service_queue", "connection reset")),
            message("user.created", 2),
        ]);
        let (_tx, rx) = watch::channel(false);

        let stats = run_delivery_loop(deliveries, router_with(handler.clone()), rx).await;

        assert_eq!(*handler.seen.lock(), vec![1]);
        assert_eq!(stats.exit, LoopExit::StreamError);
    }

    #[tokio::test]
    async fn test_shutdown_stops_waiting_loop_without_further_dispatch() {
        let handler = Arc::new(RecordingHandler::default());
        let (msg_tx, msg_rx) = tokio::sync::mpsc::unbounded_channel();
        let deliveries = futures::stream::unfold(msg_rx, |mut rx| async move {
            rx.recv().await.map(|m| (m, rx))
        });
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(run_delivery_loop(
            deliveries,
            router_with(handler.clone()),
            shutdown_rx,
        ));

        msg_tx.send(message("user.created", 1)).unwrap();
        while handler.seen.lock().is_empty() {
            tokio::task::yield_now().await;
        }

        shutdown_tx.send(true).unwrap();
        let stats = handle.await.unwrap();
        assert_eq!(stats.exit, LoopExit::Shutdown);

        // Anything arriving after close is never dispatched
        let _ = msg_tx.send(message("user.created", 2));
        assert_eq!(*handler.seen.lock(), vec![1]);
    }

    #[tokio::test]
    async fn test_already_signalled_shutdown_dispatches_nothing() {
        let handler = Arc::new(RecordingHandler::default());
        let deliveries = futures::stream::iter(vec![message("user.created", 1)]);
        let (_tx, rx) = watch::channel(true);

        let stats = run_delivery_loop(deliveries, router_with(handler.clone()), rx).await;

        assert!(handler.seen.lock().is_empty());
        assert_eq!(stats.exit, LoopExit::Shutdown);
    }

    #[tokio::test]
    #[ignore = "requires RabbitMQ running"]
    async fn test_rabbitmq_consumer_lifecycle() {
        let url = std::env::var("RABBITMQ_URL")
            .unwrap_or_else(|_| crate::config::DEFAULT_RABBITMQ_URL.to_string());
        let connection = BrokerConnection::connect(&url).await.unwrap();
        let queue = format!("test_consumer_{}", uuid::Uuid::new_v4());
        let mut consumer = UserEventConsumer::from_connection(
            connection,
            Arc::new(UserEventRouter::new()),
            &queue,
        );
        assert_eq!(consumer.state(), ConsumerState::Connected);

        consumer.start_consuming().await.unwrap();
        assert_eq!(consumer.state(), ConsumerState::Consuming);
        assert!(consumer.is_consuming());
        assert!(consumer.start_consuming().await.is_err());

        let stats = consumer.close().await.unwrap();
        assert_eq!(stats.exit, LoopExit::Shutdown);
        assert_eq!(consumer.state(), ConsumerState::Closed);
        assert!(consumer.close().await.is_none());
    }
}
