//! Wire-level checks against a live broker.
//!
//! Run with: RABBITMQ_URL=amqp://... cargo test --test rabbitmq_integration_tests -- --ignored

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{user_event_body, Harness};
use futures::StreamExt;
use lapin::options::{
    BasicConsumeOptions, BasicPublishOptions, ExchangeDeclareOptions, QueueBindOptions,
    QueueDeclareOptions, QueueDeleteOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, ExchangeKind};
use task_service::config::DEFAULT_RABBITMQ_URL;
use task_service::constants::broker;
use task_service::messaging::{
    BrokerConnection, ConsumerState, EventPublisher, RabbitMqPublisher, UserEventConsumer,
};
use task_service::services::TaskLifecycleService;
use task_service::{NewTask, TaskEvent, TaskStore};

fn rabbitmq_url() -> String {
    std::env::var("RABBITMQ_URL").unwrap_or_else(|_| DEFAULT_RABBITMQ_URL.to_string())
}

#[tokio::test]
#[ignore = "requires RabbitMQ running"]
async fn task_created_is_observed_on_task_events_exchange() {
    let url = rabbitmq_url();
    let publisher = Arc::new(RabbitMqPublisher::connect(&url).await.unwrap());

    // Observer queue bound to all task events
    let observer = BrokerConnection::connect(&url).await.unwrap();
    let queue = observer
        .channel()
        .queue_declare(
            "",
            QueueDeclareOptions {
                exclusive: true,
                auto_delete: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .unwrap();
    observer
        .channel()
        .queue_bind(
            queue.name().as_str(),
            broker::TASK_EVENTS_EXCHANGE,
            "task.*",
            QueueBindOptions::default(),
            FieldTable::default(),
        )
        .await
        .unwrap();
    let mut deliveries = observer
        .channel()
        .basic_consume(
            queue.name().as_str(),
            "observer",
            BasicConsumeOptions {
                no_ack: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .unwrap();

    let h = Harness::new();
    let service = TaskLifecycleService::new(h.store.clone(), Some(publisher.clone()));
    let task = service
        .create_task(NewTask::new("Buy milk", 7))
        .await
        .unwrap();

    let delivery = tokio::time::timeout(Duration::from_secs(5), deliveries.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(delivery.routing_key.as_str(), "task.created");
    assert_eq!(
        delivery.properties.delivery_mode(),
        &Some(broker::PERSISTENT_DELIVERY_MODE)
    );
    let event: TaskEvent = serde_json::from_slice(&delivery.data).unwrap();
    assert_eq!(event, TaskEvent::created(&task));

    publisher.close().await;
    observer.close().await;
}

#[tokio::test]
#[ignore = "requires RabbitMQ running"]
async fn consumer_creates_welcome_task_from_live_user_created() {
    let url = rabbitmq_url();
    let h = Harness::new();
    let suffix = uuid::Uuid::new_v4();
    let queue = format!("task_service_test_{suffix}");
    let exchange = format!("user_events_test_{suffix}");

    let connection = BrokerConnection::connect(&url).await.unwrap();
    let mut consumer = UserEventConsumer::from_connection(connection, h.router.clone(), &queue);
    consumer.start_consuming().await.unwrap();
    assert_eq!(consumer.state(), ConsumerState::Consuming);

    let producer = BrokerConnection::connect(&url).await.unwrap();
    producer
        .channel()
        .exchange_declare(
            &exchange,
            ExchangeKind::Topic,
            ExchangeDeclareOptions {
                auto_delete: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .unwrap();
    producer
        .channel()
        .queue_bind(
            &queue,
            &exchange,
            "user.*",
            QueueBindOptions::default(),
            FieldTable::default(),
        )
        .await
        .unwrap();
    producer
        .channel()
        .basic_publish(
            &exchange,
            "user.created",
            BasicPublishOptions::default(),
            &user_event_body(42),
            BasicProperties::default(),
        )
        .await
        .unwrap()
        .await
        .unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while h.store.find_by_owner(42).await.unwrap().is_empty()
        && tokio::time::Instant::now() < deadline
    {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let tasks = h.store.find_by_owner(42).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Welcome to Todo App!");

    let stats = consumer.close().await.unwrap();
    assert_eq!(stats.handled, 1);
    assert_eq!(consumer.state(), ConsumerState::Closed);

    let _ = producer
        .channel()
        .queue_delete(&queue, QueueDeleteOptions::default())
        .await;
    producer.close().await;
}
