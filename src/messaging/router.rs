//! # User Event Router
//!
//! Maps each known `UserEventKind` to the handler that reacts to it. Routing
//! keys outside the known set fall through to an explicit unknown branch and
//! are dropped without touching any state.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::events::{UserEvent, UserEventKind};

/// What a handler changed in the task store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    TaskCreated { task_id: i64 },
    TasksDeleted { count: u64 },
    NoChange,
}

/// Reaction to one kind of user event
#[async_trait]
pub trait UserEventHandler: Send + Sync + 'static {
    async fn handle(&self, event: &UserEvent) -> Result<HandlerOutcome>;

    fn name(&self) -> &'static str;
}

/// Result of dispatching a single inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled {
        kind: UserEventKind,
        outcome: HandlerOutcome,
    },
    UnknownRoutingKey(String),
    NoHandler(UserEventKind),
    DecodeFailed {
        kind: UserEventKind,
        message: String,
    },
    HandlerFailed {
        kind: UserEventKind,
        message: String,
    },
}

impl DispatchOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Handled { .. })
    }
}

/// Enum-keyed handler table
#[derive(Default, Clone)]
pub struct UserEventRouter {
    handlers: HashMap<UserEventKind, Arc<dyn UserEventHandler>>,
}

impl fmt::Debug for UserEventRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut registered: Vec<_> = self
            .handlers
            .iter()
            .map(|(kind, handler)| (kind.routing_key(), handler.name()))
            .collect();
        registered.sort();
        f.debug_struct("UserEventRouter")
            .field("handlers", &registered)
            .finish()
    }
}

impl UserEventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one for `kind`
    pub fn register(
        &mut self,
        kind: UserEventKind,
        handler: Arc<dyn UserEventHandler>,
    ) -> Option<Arc<dyn UserEventHandler>> {
        self.handlers.insert(kind, handler)
    }

    pub fn with_handler(mut self, kind: UserEventKind, handler: Arc<dyn UserEventHandler>) -> Self {
        self.register(kind, handler);
        self
    }

    /// Decode and dispatch one message by routing key
    ///
    /// Never fails: every problem is logged and reported in the outcome.
    pub async fn dispatch(&self, routing_key: &str, body: &[u8]) -> DispatchOutcome {
        debug!(
            routing_key = routing_key,
            body = %String::from_utf8_lossy(body),
            "Received message"
        );

        let Some(kind) = UserEventKind::from_routing_key(routing_key) else {
            warn!(routing_key = routing_key, "Unknown routing key, dropping message");
            return DispatchOutcome::UnknownRoutingKey(routing_key.to_string());
        };

        let event = match UserEvent::from_bytes(body) {
            Ok(event) => event,
            Err(e) => {
                error!(routing_key = routing_key, error = %e, "Failed to decode user event");
                return DispatchOutcome::DecodeFailed {
                    kind,
                    message: e.to_string(),
                };
            }
        };

        let Some(handler) = self.handlers.get(&kind) else {
            warn!(routing_key = routing_key, "No handler registered, dropping message");
            return DispatchOutcome::NoHandler(kind);
        };

        match handler.handle(&event).await {
            Ok(outcome) => {
                info!(
                    routing_key = routing_key,
                    user_id = event.user_id,
                    handler = handler.name(),
                    outcome = ?outcome,
                    "Handled user event"
                );
                DispatchOutcome::Handled { kind, outcome }
            }
            Err(e) => {
                error!(
                    routing_key = routing_key,
                    user_id = event.user_id,
                    handler = handler.name(),
                    error = %e,
                    "User event handler failed"
                );
                DispatchOutcome::HandlerFailed {
                    kind,
                    message: e.to_string(),
                }
            }
        }
    }
}
