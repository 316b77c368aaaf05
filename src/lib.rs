#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, RabbitMQ in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Task Service
//!
//! Task CRUD service that keeps itself consistent with the rest of the
//! platform through RabbitMQ events.
//!
//! ## Overview
//!
//! Every task mutation made through [`services::TaskLifecycleService`] is
//! followed by a `task.created`, `task.updated` or `task.deleted` event on the
//! durable `task_events` topic exchange. In the other direction a consumer on
//! `task_service_queue` reacts to user lifecycle events: new users get a
//! welcome task and deleted users lose all their tasks.
//!
//! Events are best-effort notifications. The task store is the source of
//! truth; a failed publish is logged and the originating operation still
//! succeeds. If the broker is unreachable at startup the service keeps
//! serving CRUD without messaging.
//!
//! ## Module Organization
//!
//! - [`config`] - Environment-sourced configuration with defaults
//! - [`error`] - Service error taxonomy
//! - [`models`] - Task records and input types
//! - [`store`] - `TaskStore` trait with PostgreSQL and in-memory backends
//! - [`database`] - Connection pool and embedded migrations
//! - [`events`] - Task and user event wire contracts
//! - [`messaging`] - Broker connection, publisher, consumer and event router
//! - [`services`] - Task lifecycle facade and user event handlers
//! - [`web`] - axum HTTP surface
//! - [`bootstrap`] - Startup wiring, degraded mode and shutdown
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use task_service::messaging::InMemoryEventPublisher;
//! use task_service::models::NewTask;
//! use task_service::services::TaskLifecycleService;
//! use task_service::store::InMemoryTaskStore;
//!
//! # async fn example() -> task_service::error::Result<()> {
//! let service = TaskLifecycleService::new(
//!     Arc::new(InMemoryTaskStore::new()),
//!     Some(Arc::new(InMemoryEventPublisher::new())),
//! );
//! let task = service.create_task(NewTask::new("Buy milk", 7)).await?;
//! println!("created task {}", task.id);
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! Unit tests live next to the code. Tests that need a live broker or
//! database are `#[ignore]`d; run them with `cargo test -- --ignored` after
//! pointing `RABBITMQ_URL` and `DATABASE_URL` at real services.

pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod events;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod services;
pub mod store;
pub mod web;

pub use config::ServiceConfig;
pub use error::{Result, TaskServiceError};
pub use events::{TaskEvent, TaskEventKind, UserEvent, UserEventKind};
pub use models::{NewTask, Task, TaskPatch};
pub use services::TaskLifecycleService;
pub use store::TaskStore;
