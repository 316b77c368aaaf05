//! # Event Contracts
//!
//! Message bodies exchanged with the broker: task events this service
//! publishes and user events it consumes.

pub mod task_event;
pub mod user_event;

pub use task_event::{TaskEvent, TaskEventKind};
pub use user_event::{UserEvent, UserEventKind};
